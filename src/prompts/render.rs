// src/prompts/render.rs
// Choice list rendering for list-driven prompts

use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::recognizers::numbers::words_for;
use crate::recognizers::Choice;

/// How a list-driven prompt renders its choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListStyle {
    /// Send the prompt text untouched.
    None,
    /// Append the choices inline: " (1) red, (2) green, or (3) blue".
    #[default]
    Inline,
    /// Append the choices as a numbered list on separate lines.
    List,
}

/// Compose the outbound prompt from a base activity and the choice list.
/// Returns `None` when there is neither a base prompt nor anything to
/// render.
pub fn append_choices(
    base: Option<&Activity>,
    choices: &[Choice],
    style: ListStyle,
    locale: &str,
) -> Option<Activity> {
    if choices.is_empty() || style == ListStyle::None {
        return base.cloned();
    }

    let rendered = match style {
        ListStyle::Inline => inline_list(choices, locale),
        ListStyle::List => numbered_list(choices),
        ListStyle::None => unreachable!(),
    };

    match base {
        Some(activity) => {
            let mut out = activity.clone();
            let text = out.text.take().unwrap_or_default();
            out.text = Some(if text.is_empty() {
                rendered.trim_start().to_string()
            } else {
                format!("{text}{rendered}")
            });
            Some(out)
        }
        None => Some(Activity::message(rendered.trim_start().to_string())),
    }
}

fn display_title(choice: &Choice) -> &str {
    choice
        .action
        .as_ref()
        .map(|a| a.title.as_str())
        .unwrap_or(&choice.value)
}

fn inline_list(choices: &[Choice], locale: &str) -> String {
    let or_word = words_for(locale).or_word;
    let mut out = String::from(" ");
    for (i, choice) in choices.iter().enumerate() {
        if i > 0 {
            if i == choices.len() - 1 {
                // Oxford comma only with three or more entries.
                if choices.len() == 2 {
                    out.push_str(&format!(" {or_word} "));
                } else {
                    out.push_str(&format!(", {or_word} "));
                }
            } else {
                out.push_str(", ");
            }
        }
        out.push_str(&format!("({}) {}", i + 1, display_title(choice)));
    }
    out
}

fn numbered_list(choices: &[Choice]) -> String {
    let mut out = String::from("\n\n");
    for (i, choice) in choices.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("   {}. {}", i + 1, display_title(choice)));
    }
    out
}
