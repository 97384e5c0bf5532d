//! Instruction block construction for a single step.

use std::fmt::Write as _;
use taskweave_core::memory::UserMemory;
use taskweave_core::persona::AgentPersona;
use taskweave_core::tool::ToolDescriptor;

use crate::protocol::TOOL_MARKER;

/// How a step's answer will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode<'a> {
    /// Step `index` (0-based) of an explicit task chain toward `goal`.
    ChainStep {
        index: usize,
        total: usize,
        goal: &'a str,
    },
    /// The single implicit step over the whole goal.
    Final,
}

/// Build the system instruction block for one step.
pub fn build_instructions(
    persona: &AgentPersona,
    sub_goal: &str,
    mode: PromptMode<'_>,
    tools: &[ToolDescriptor],
    memory: &UserMemory,
) -> String {
    let mut out = String::new();

    out.push_str(persona.system_prompt.trim());
    out.push_str("\n\n");

    match mode {
        PromptMode::ChainStep { index, total, goal } => {
            let _ = writeln!(out, "## Current task");
            let _ = writeln!(out, "Overall goal: {goal}");
            let _ = writeln!(out, "Sub-task {} of {total}: {sub_goal}", index + 1);
        }
        PromptMode::Final => {
            let _ = writeln!(out, "## Current task");
            let _ = writeln!(out, "{sub_goal}");
        }
    }

    out.push_str("\n## Tools\n");
    if tools.is_empty() {
        out.push_str("(no tools available)\n");
    } else {
        for tool in tools {
            let _ = writeln!(out, "- {}: {}", tool.name, tool.description);
        }
    }

    let _ = write!(
        out,
        "\nTo call a tool, write a line of the form:\n{TOOL_MARKER} tool-name: parameter\n\
         Use one line per call. Tool results are shown after your answer.\n"
    );

    out.push_str("\n## Memory\n");
    out.push_str(&memory.render());
    out.push('\n');
    out.push_str(
        "\nTo store a fact for later tasks, write a line starting with \"Remember\".\n\
         If the information is insufficient, ask the user a clarifying question.\n",
    );

    match mode {
        PromptMode::ChainStep { .. } => {
            out.push_str("\nOutput only the result of this sub-task.");
        }
        PromptMode::Final => {
            out.push_str("\nSummarize your work and output the final answer.");
        }
    }

    out
}
