use serde_json::Value;

use super::Submission;

/// Check the configured required keys. Returns one message per problem;
/// an empty list means the submission is acceptable.
pub fn missing_required(submission: &Submission, required: &[String]) -> Vec<String> {
    let mut problems = Vec::new();

    for name in required {
        match submission.get(name) {
            None | Some(Value::Null) => {
                problems.push(format!("Missing required field: {name}"));
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                problems.push(format!("Required field is empty: {name}"));
            }
            Some(Value::Array(a)) if a.is_empty() => {
                problems.push(format!("Required field is empty: {name}"));
            }
            _ => {}
        }
    }

    problems
}
