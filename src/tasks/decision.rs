// ABOUTME: Decision task: fires the actions of the first rule whose condition holds
// ABOUTME: Returns true when a rule matched and false otherwise

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::TaskHandler;
use crate::engine::error::{EngineError, Result};
use crate::engine::ExecutionContext;
use crate::model::Task;
use crate::template::{Condition, VariableResolver};

pub struct DecisionHandler;

#[derive(Debug, Clone, Deserialize)]
struct Rule {
    #[serde(default)]
    condition: Option<Value>,
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Action {
    /// `value` is resolved against the instance variables first, so `${...}`
    /// markers inside it expand.
    SetVariable {
        variable: String,
        #[serde(default)]
        value: Value,
    },
    /// Placeholder for an outbound call; accepted and ignored.
    CallApi {
        #[serde(default)]
        url: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

fn rules(task: &Task) -> Result<Vec<Rule>> {
    match task.config.get("rules") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| EngineError::invalid_config(&task.id, format!("invalid rules: {}", e))),
    }
}

#[async_trait]
impl TaskHandler for DecisionHandler {
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value> {
        let rules = rules(task)?;
        let variables = ctx.instance.variables().await;

        let Some((index, rule)) = rules.iter().enumerate().find(|(_, rule)| {
            let condition = rule
                .condition
                .as_ref()
                .map(Condition::from_value)
                .unwrap_or_else(|| Condition::new("eq", Value::from(""), Value::from("")));
            condition.evaluate(&variables)
        }) else {
            debug!(task_id = %task.id, "No decision rule matched");
            return Ok(Value::Bool(false));
        };

        info!(task_id = %task.id, rule = index, "Decision rule matched");
        let resolver = VariableResolver::new(&variables);
        for action in &rule.actions {
            match action {
                Action::SetVariable { variable, value } => {
                    ctx.instance
                        .set_variable(variable.clone(), resolver.resolve(value))
                        .await;
                }
                Action::CallApi { url } => {
                    debug!(task_id = %task.id, ?url, "call_api action is not wired to a transport");
                }
                Action::Unsupported => {
                    warn!(task_id = %task.id, "Ignoring unsupported decision action");
                }
            }
        }

        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskType;
    use crate::tasks::test_context;
    use serde_json::json;

    fn triage() -> Task {
        Task::new("triage", TaskType::Decision).with_config(json!({
            "rules": [
                {
                    "condition": {"operator": "gt", "left": "$risk", "right": 0.8},
                    "actions": [{"type": "set_variable", "variable": "pathway", "value": "urgent"}]
                },
                {
                    "condition": {"operator": "gt", "left": "$risk", "right": 0.5},
                    "actions": [
                        {"type": "set_variable", "variable": "pathway", "value": "review-${ward}"},
                        {"type": "call_api", "url": "https://ehr.local/flag"},
                        {"type": "page_someone"}
                    ]
                }
            ]
        }))
    }

    #[tokio::test]
    async fn test_first_matching_rule_only() {
        let ctx = test_context(json!({"risk": 0.9}));

        let output = DecisionHandler.execute(&triage(), &ctx).await.unwrap();

        assert_eq!(output, json!(true));
        assert_eq!(ctx.instance.variable("pathway").await, Some(json!("urgent")));
    }

    #[tokio::test]
    async fn test_later_rule_and_resolved_value() {
        let ctx = test_context(json!({"risk": 0.6, "ward": "cardio"}));

        let output = DecisionHandler.execute(&triage(), &ctx).await.unwrap();

        assert_eq!(output, json!(true));
        assert_eq!(
            ctx.instance.variable("pathway").await,
            Some(json!("review-cardio"))
        );
    }

    #[tokio::test]
    async fn test_no_match_returns_false() {
        let ctx = test_context(json!({"risk": 0.1}));

        let output = DecisionHandler.execute(&triage(), &ctx).await.unwrap();

        assert_eq!(output, json!(false));
        assert_eq!(ctx.instance.variable("pathway").await, None);
    }

    #[tokio::test]
    async fn test_rule_without_condition_always_matches() {
        let ctx = test_context(json!({}));
        let task = Task::new("default", TaskType::Decision).with_config(json!({
            "rules": [{"actions": [{"type": "set_variable", "variable": "seen", "value": true}]}]
        }));

        assert_eq!(DecisionHandler.execute(&task, &ctx).await.unwrap(), json!(true));
        assert_eq!(ctx.instance.variable("seen").await, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_malformed_rules() {
        let task = Task::new("bad", TaskType::Decision).with_config(json!({"rules": "nope"}));
        let error = DecisionHandler
            .execute(&task, &test_context(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::InvalidConfiguration { .. }));
    }
}
