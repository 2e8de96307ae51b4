// src/core/config_resolver.rs

use crate::core::config_store::{ConfigMap, ConfigStore};
use crate::core::prompter::{Prompter, Question};
use anyhow::{Result, anyhow};
use serde_json::Value;

/// Merges persisted settings, command-supplied overrides, and freshly
/// prompted answers into one configuration, writing the merge back to the
/// store under `config_key`.
///
/// Precedence, lowest to highest: persisted value, override, prompted answer.
/// The merge is a shallow field-by-field overlay, never a deep merge.
///
/// A question is asked iff `override_config` is set, or its field is absent
/// from both the overrides and the persisted map. Prompts are seeded with the
/// persisted value as their default, so a forced re-ask still shows the
/// previous value instead of a blank.
///
/// Overrides only count for fields that belong to this question set; stray
/// keys in `overrides` are ignored. The merged result is persisted
/// unconditionally (even when nothing was asked) so that supplied overrides
/// are remembered on the next invocation.
pub fn resolve(
    store: &mut dyn ConfigStore,
    prompter: &dyn Prompter,
    config_key: &str,
    overrides: &ConfigMap,
    questions: Vec<Question>,
    override_config: bool,
) -> Result<ConfigMap> {
    let persisted = store.get(config_key).unwrap_or_default();

    let overrides: ConfigMap = questions
        .iter()
        .filter_map(|question| {
            overrides
                .get(&question.name)
                .map(|value| (question.name.clone(), value.clone()))
        })
        .collect();

    let to_ask: Vec<Question> = questions
        .into_iter()
        .filter(|question| {
            override_config
                || (!overrides.contains_key(&question.name)
                    && !persisted.contains_key(&question.name))
        })
        .map(|mut question| {
            if let Some(previous) = persisted.get(&question.name) {
                question.default = Some(previous.clone());
            }
            question
        })
        .collect();

    log::debug!(
        "Resolving config '{}': {} persisted field(s), {} override(s), {} question(s) to ask",
        config_key,
        persisted.len(),
        overrides.len(),
        to_ask.len()
    );

    let answers = prompter.ask(&to_ask)?;

    let mut merged = persisted;
    merged.extend(overrides);
    merged.extend(answers);

    store.set(config_key, merged.clone())?;

    Ok(merged)
}

/// Fetches a required string field out of a resolved configuration.
///
/// Structural problems with stored values surface here, at the point of use,
/// so that a stale or hand-edited store fails the enclosing command instead
/// of silently proceeding.
pub fn require_str<'a>(config: &'a ConfigMap, field: &str) -> Result<&'a str> {
    config
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            anyhow!(
                "Configuration is missing the '{field}' setting. Re-run with --override-config to enter it again."
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_store::StoreError;
    use crate::core::prompter::PromptError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory stand-in for the JSON file store.
    #[derive(Default)]
    struct MemoryStore {
        namespaces: BTreeMap<String, ConfigMap>,
    }

    impl ConfigStore for MemoryStore {
        fn get(&self, namespace: &str) -> Option<ConfigMap> {
            self.namespaces.get(namespace).cloned()
        }

        fn set(&mut self, namespace: &str, config: ConfigMap) -> Result<(), StoreError> {
            self.namespaces.insert(namespace.to_string(), config);
            Ok(())
        }

        fn clear(&mut self) -> Result<(), StoreError> {
            self.namespaces.clear();
            Ok(())
        }
    }

    /// Prompter double that replays canned answers and records which
    /// questions were actually asked (name plus seeded default).
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: ConfigMap,
        asked: RefCell<Vec<(String, Option<Value>)>>,
    }

    impl ScriptedPrompter {
        fn with_answers(pairs: &[(&str, Value)]) -> Self {
            Self {
                answers: pairs
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
                asked: RefCell::new(Vec::new()),
            }
        }

        fn asked_names(&self) -> Vec<String> {
            self.asked
                .borrow()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&self, questions: &[Question]) -> Result<ConfigMap, PromptError> {
            let mut answers = ConfigMap::new();
            for question in questions {
                self.asked
                    .borrow_mut()
                    .push((question.name.clone(), question.default.clone()));
                if let Some(answer) = self.answers.get(&question.name) {
                    answers.insert(question.name.clone(), answer.clone());
                }
            }
            Ok(answers)
        }
    }

    fn retriever_questions() -> Vec<Question> {
        vec![
            Question::text("username", "Username"),
            Question::secret("password", "Password"),
            Question::text("url", "Url"),
        ]
    }

    fn map(pairs: &[(&str, Value)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn answers_win_over_overrides_win_over_persisted() {
        let mut store = MemoryStore::default();
        store
            .set("retriever", map(&[("url", json!("ftp://old")), ("username", json!("anna"))]))
            .unwrap();

        let prompter = ScriptedPrompter::with_answers(&[("password", json!("hunter2"))]);
        let overrides = map(&[("url", json!("ftp://flag"))]);

        let resolved = resolve(
            &mut store,
            &prompter,
            "retriever",
            &overrides,
            retriever_questions(),
            false,
        )
        .unwrap();

        assert_eq!(resolved.get("url"), Some(&json!("ftp://flag")));
        assert_eq!(resolved.get("username"), Some(&json!("anna")));
        assert_eq!(resolved.get("password"), Some(&json!("hunter2")));
    }

    #[test]
    fn satisfied_fields_are_never_reprompted() {
        let mut store = MemoryStore::default();
        store
            .set("retriever", map(&[("username", json!("anna")), ("password", json!("pw"))]))
            .unwrap();

        let prompter = ScriptedPrompter::with_answers(&[("url", json!("ftp://new"))]);

        let resolved = resolve(
            &mut store,
            &prompter,
            "retriever",
            &ConfigMap::new(),
            retriever_questions(),
            false,
        )
        .unwrap();

        assert_eq!(prompter.asked_names(), vec!["url".to_string()]);
        assert_eq!(resolved.get("username"), Some(&json!("anna")));
        assert_eq!(resolved.get("url"), Some(&json!("ftp://new")));
    }

    #[test]
    fn flag_supplied_fields_are_not_asked() {
        let mut store = MemoryStore::default();
        let prompter = ScriptedPrompter::with_answers(&[
            ("username", json!("anna")),
            ("password", json!("pw")),
        ]);
        let overrides = map(&[("url", json!("ftp://flag"))]);

        resolve(
            &mut store,
            &prompter,
            "retriever",
            &overrides,
            retriever_questions(),
            false,
        )
        .unwrap();

        assert_eq!(
            prompter.asked_names(),
            vec!["username".to_string(), "password".to_string()]
        );
    }

    #[test]
    fn force_reask_prompts_everything_with_previous_values_as_defaults() {
        let mut store = MemoryStore::default();
        store
            .set(
                "retriever",
                map(&[
                    ("username", json!("anna")),
                    ("password", json!("pw")),
                    ("url", json!("ftp://old")),
                ]),
            )
            .unwrap();

        let prompter = ScriptedPrompter::with_answers(&[
            ("username", json!("berit")),
            ("password", json!("pw2")),
            ("url", json!("ftp://new")),
        ]);

        let resolved = resolve(
            &mut store,
            &prompter,
            "retriever",
            &ConfigMap::new(),
            retriever_questions(),
            true,
        )
        .unwrap();

        let asked = prompter.asked.borrow();
        assert_eq!(asked.len(), 3);
        assert!(asked.contains(&("url".to_string(), Some(json!("ftp://old")))));
        assert!(asked.contains(&("username".to_string(), Some(json!("anna")))));
        assert_eq!(resolved.get("url"), Some(&json!("ftp://new")));
    }

    #[test]
    fn merge_is_persisted_even_when_nothing_was_asked() {
        let mut store = MemoryStore::default();
        store
            .set(
                "retriever",
                map(&[
                    ("username", json!("anna")),
                    ("password", json!("pw")),
                    ("url", json!("ftp://old")),
                ]),
            )
            .unwrap();

        let prompter = ScriptedPrompter::default();
        let overrides = map(&[("url", json!("ftp://flag"))]);

        resolve(
            &mut store,
            &prompter,
            "retriever",
            &overrides,
            retriever_questions(),
            false,
        )
        .unwrap();

        assert!(prompter.asked_names().is_empty());
        let persisted = store.get("retriever").unwrap();
        assert_eq!(persisted.get("url"), Some(&json!("ftp://flag")));
    }

    #[test]
    fn override_keys_outside_the_question_set_are_ignored() {
        let mut store = MemoryStore::default();
        let prompter = ScriptedPrompter::with_answers(&[
            ("username", json!("anna")),
            ("password", json!("pw")),
            ("url", json!("ftp://new")),
        ]);
        let overrides = map(&[("verbose", json!(true))]);

        let resolved = resolve(
            &mut store,
            &prompter,
            "retriever",
            &overrides,
            retriever_questions(),
            false,
        )
        .unwrap();

        assert!(resolved.get("verbose").is_none());
    }

    #[test]
    fn cleared_store_behaves_like_a_first_run() {
        let mut store = MemoryStore::default();
        store
            .set(
                "retriever",
                map(&[
                    ("username", json!("anna")),
                    ("password", json!("pw")),
                    ("url", json!("ftp://old")),
                ]),
            )
            .unwrap();
        store.clear().unwrap();
        assert!(store.get("retriever").is_none());

        let prompter = ScriptedPrompter::with_answers(&[
            ("username", json!("anna")),
            ("password", json!("pw")),
            ("url", json!("ftp://new")),
        ]);

        resolve(
            &mut store,
            &prompter,
            "retriever",
            &ConfigMap::new(),
            retriever_questions(),
            false,
        )
        .unwrap();

        assert_eq!(prompter.asked_names().len(), 3);
    }

    #[test]
    fn require_str_reports_missing_and_non_string_fields() {
        let config = map(&[("list", json!("abc123")), ("count", json!(3))]);
        assert_eq!(require_str(&config, "list").unwrap(), "abc123");
        assert!(require_str(&config, "api_key").is_err());
        assert!(require_str(&config, "count").is_err());
    }
}
