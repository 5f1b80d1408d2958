//! Interactive input collection.

use crate::cli::ProvisionArgs;
use crate::error::CliError;
use hyperprov_catalog::ProvisionRequest;
use rootcause::Report;

/// Asks the operator for values.
pub trait Prompter {
    /// Free text; may be empty.
    fn text(&self, prompt: &str) -> Result<String, CliError>;

    /// Index of the chosen item.
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize, CliError>;

    /// Hidden input.
    fn password(&self, prompt: &str) -> Result<String, CliError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

fn input_error(e: dialoguer::Error) -> CliError {
    CliError::Input {
        reason: e.to_string(),
    }
}

impl Prompter for TerminalPrompter {
    fn text(&self, prompt: &str) -> Result<String, CliError> {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<usize, CliError> {
        dialoguer::Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .map_err(input_error)
    }

    fn password(&self, prompt: &str) -> Result<String, CliError> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(input_error)
    }
}

/// Refuses every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompter;

impl NoPrompter {
    fn refuse(prompt: &str) -> CliError {
        CliError::Input {
            reason: format!("{prompt} is required when prompting is disabled"),
        }
    }
}

impl Prompter for NoPrompter {
    fn text(&self, prompt: &str) -> Result<String, CliError> {
        Err(Self::refuse(prompt))
    }

    fn select(&self, prompt: &str, _items: &[String]) -> Result<usize, CliError> {
        Err(Self::refuse(prompt))
    }

    fn password(&self, prompt: &str) -> Result<String, CliError> {
        Err(Self::refuse(prompt))
    }
}

/// Builds one request per VM name, prompting for whatever the arguments
/// leave out. Assignee and department apply to every VM.
///
/// # Errors
///
/// Returns an error if a prompt fails or the collected values are invalid.
pub fn collect_requests(
    args: &ProvisionArgs,
    departments: &[String],
    prompter: &dyn Prompter,
) -> Result<Vec<ProvisionRequest>, Report<CliError>> {
    let names = if args.names.is_empty() {
        vec![prompter.text("VM name")?]
    } else {
        args.names.clone()
    };

    let assignee = match &args.assignee {
        Some(assignee) => assignee.clone(),
        None => prompter.text("Assigned to")?,
    };

    let department = match &args.department {
        Some(department) => department.clone(),
        None if departments.is_empty() => prompter.text("Department")?,
        None => {
            let index = prompter.select("Department", departments)?;
            departments
                .get(index)
                .cloned()
                .ok_or_else(|| CliError::Input {
                    reason: format!("no department at position {index}"),
                })?
        }
    };

    let mut requests = Vec::with_capacity(names.len());
    for name in names {
        let request = ProvisionRequest::new(name, assignee.as_str(), department.as_str())
            .map_err(|e| CliError::Input {
                reason: e.to_string(),
            })?;
        if requests
            .iter()
            .any(|r: &ProvisionRequest| r.vm_name() == request.vm_name())
        {
            return Err(CliError::Input {
                reason: format!("VM name '{}' given more than once", request.vm_name()),
            }
            .into());
        }
        requests.push(request);
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Answers prompts from a script and records what was asked.
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: RefCell<VecDeque<String>>,
        asked: RefCell<Vec<String>>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().map(ToString::to_string).collect()),
                asked: RefCell::default(),
            }
        }

        fn next(&self, prompt: &str) -> Result<String, CliError> {
            self.asked.borrow_mut().push(prompt.to_string());
            self.answers
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| CliError::Input {
                    reason: "script exhausted".to_string(),
                })
        }
    }

    impl Prompter for ScriptedPrompter {
        fn text(&self, prompt: &str) -> Result<String, CliError> {
            self.next(prompt)
        }

        fn select(&self, prompt: &str, _items: &[String]) -> Result<usize, CliError> {
            self.next(prompt).map(|answer| answer.parse().unwrap())
        }

        fn password(&self, prompt: &str) -> Result<String, CliError> {
            self.next(prompt)
        }
    }

    fn departments() -> Vec<String> {
        vec!["ACCT".to_string(), "IT".to_string()]
    }

    #[test]
    fn flags_need_no_prompts() {
        let args = ProvisionArgs {
            names: vec!["vdi-01".to_string(), "vdi-02".to_string()],
            assignee: Some("Jane".to_string()),
            department: Some("IT".to_string()),
        };

        let requests = collect_requests(&args, &departments(), &NoPrompter).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].vm_name(), "vdi-02");
        assert_eq!(requests[1].department(), "IT");
    }

    #[test]
    fn prompts_for_missing_values_and_selects_department() {
        let prompter = ScriptedPrompter::new(&["vdi-03", "Sam", "1"]);

        let requests =
            collect_requests(&ProvisionArgs::default(), &departments(), &prompter).unwrap();

        assert_eq!(
            prompter.asked.borrow().as_slice(),
            ["VM name", "Assigned to", "Department"]
        );
        assert_eq!(requests[0].vm_name(), "vdi-03");
        assert_eq!(requests[0].assignee(), "Sam");
        assert_eq!(requests[0].department(), "IT");
    }

    #[test]
    fn free_text_department_without_list() {
        let prompter = ScriptedPrompter::new(&["Sam", "FSR"]);
        let args = ProvisionArgs {
            names: vec!["vdi-04".to_string()],
            ..ProvisionArgs::default()
        };

        let requests = collect_requests(&args, &[], &prompter).unwrap();
        assert_eq!(requests[0].department(), "FSR");
    }

    #[test]
    fn no_prompter_reports_missing_value() {
        let args = ProvisionArgs {
            names: vec!["vdi-05".to_string()],
            assignee: Some("Sam".to_string()),
            department: None,
        };

        let err = collect_requests(&args, &departments(), &NoPrompter).unwrap_err();
        assert!(err.to_string().contains("Department is required"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let args = ProvisionArgs {
            names: vec!["vdi-06".to_string(), " vdi-06".to_string()],
            assignee: Some(String::new()),
            department: Some("IT".to_string()),
        };

        let err = collect_requests(&args, &departments(), &NoPrompter).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
