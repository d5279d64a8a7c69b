//! Interactive confirmation for `delete`.

use std::io::{self, BufRead, Write};

use drillkit_core::contract::{Confirmer, DeletionPlan};
use drillkit_core::error::Result;

/// The summary shown before deleting, ending with the `[y/N]` question.
pub fn render_plan(plan: &DeletionPlan) -> String {
    let mut out = String::from("The following resources will be DELETED:\n");
    out.push_str(&format!(
        "  Drill: [{}] {}\n",
        plan.drill.id, plan.drill.title
    ));
    for key in plan.file_keys() {
        out.push_str(&format!("  File: {key}\n"));
    }
    if !plan.orphan_tags.is_empty() {
        out.push_str("  Tags (Orphaned):\n");
        for tag in &plan.orphan_tags {
            out.push_str(&format!("    - {}\n", tag.name));
        }
    }
    if !plan.kept_tags.is_empty() {
        out.push_str("  Tags (Keeping):\n");
        for tag in &plan.kept_tags {
            out.push_str(&format!("    - {}\n", tag.name));
        }
    }
    out.push_str("\nAre you sure you want to delete these resources? [y/N]: ");
    out
}

/// Only `y` and `yes` (any case) count as consent.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Print the plan to `output` and read one line of answer from `input`.
/// End of input counts as a refusal.
pub fn confirm_with<R: BufRead, W: Write>(
    plan: &DeletionPlan,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    output.write_all(render_plan(plan).as_bytes())?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, plan: &DeletionPlan) -> Result<bool> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        Ok(confirm_with(plan, &mut stdin.lock(), &mut stdout.lock())?)
    }
}
