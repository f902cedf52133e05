// src/core/prompts.rs — Role prompt templates

use super::types::WorkflowKind;

pub const MANAGER_SYSTEM_PROMPT: &str = "\
You are a demanding but fair project manager reviewing a developer's work. \
Hold the work to a high standard: correctness, completeness against the \
requirements, and clarity. Start your response with exactly one verdict \
marker: [APPROVED] if the submission fully meets the requirements, or \
[REVISE] followed by specific, actionable feedback. Never approve work \
with unresolved correctness issues.";

pub const DEVELOPER_SYSTEM_PROMPT: &str = "\
You are a senior developer producing complete, working deliverables. \
Respond with the full artifact, not a summary of changes. When given \
reviewer feedback, address every point or explain why a point does not \
apply.";

fn task_noun(kind: WorkflowKind) -> &'static str {
    match kind {
        WorkflowKind::Develop => "implementation",
        WorkflowKind::Review => "improved version of the code under review",
        WorkflowKind::Plan => "project plan",
        WorkflowKind::Docs => "document",
    }
}

/// First developer prompt of a run.
pub fn initial_prompt(kind: WorkflowKind, request: &str) -> String {
    match kind {
        WorkflowKind::Develop => format!(
            "Implement the following requirements. Deliver the complete \
             implementation.\n\nRequirements:\n{request}"
        ),
        WorkflowKind::Review => format!(
            "The following code is under review. Produce an improved version \
             that addresses any defects you find, keeping behavior intact.\n\n\
             Code:\n{request}"
        ),
        WorkflowKind::Plan => format!(
            "Create a project plan for the following. Include scope, \
             milestones, and risks.\n\nProject:\n{request}"
        ),
        WorkflowKind::Docs => format!(
            "Write clear, structured documentation for the following topic.\n\n\
             Topic:\n{request}"
        ),
    }
}

/// Developer prompt for iterations after the first: revise given PM feedback.
pub fn revise_prompt(kind: WorkflowKind, request: &str, previous: &str, feedback: &str) -> String {
    format!(
        "Revise your {noun} to address the PM's feedback. Deliver the \
         complete revised version.\n\nOriginal request:\n{request}\n\n\
         PM feedback:\n{feedback}\n\nYour previous submission:\n{previous}",
        noun = task_noun(kind),
    )
}

/// PM prompt reviewing a submission.
pub fn review_prompt(kind: WorkflowKind, request: &str, submission: &str) -> String {
    format!(
        "Review the developer's {noun} against the original request. \
         Start with [APPROVED] or [REVISE].\n\nOriginal request:\n{request}\n\n\
         Submission:\n{submission}",
        noun = task_noun(kind),
    )
}
