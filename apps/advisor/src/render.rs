use std::fmt::Write;

use advisor_core::{RequestOutcome, ViewState};

pub fn render_state(state: &ViewState) -> String {
    let mut out = String::new();
    if let Some(banner) = state.banner() {
        let _ = writeln!(out, "! {}", banner.message());
    }
    match &state.outcome {
        RequestOutcome::Success {
            admission_chance,
            recommendations,
        } => {
            match admission_chance {
                Some(chance) => {
                    let _ = writeln!(out, "admission chance: {chance:.1}%");
                }
                None => {
                    let _ = writeln!(out, "admission chance: unavailable");
                }
            }
            let _ = writeln!(
                out,
                "showing {} of {} recommendations",
                state.visible_list.len(),
                recommendations.len()
            );
            for (rank, university) in state.visible_list.iter().enumerate() {
                let ranking = university
                    .ranking
                    .map(|r| format!("#{r}"))
                    .unwrap_or_else(|| "unranked".to_string());
                let _ = writeln!(
                    out,
                    "{:>2}. {} ({}, {}) {} tuition {:.0}{}",
                    rank + 1,
                    university.name,
                    university.city,
                    university.country,
                    ranking,
                    university.tuition_fee,
                    if university.scholarship_available {
                        " scholarship"
                    } else {
                        ""
                    }
                );
            }
        }
        RequestOutcome::Failed(failure) => {
            let _ = writeln!(out, "request failed: {}", failure.message);
        }
        other => {
            let _ = writeln!(out, "state: {other:?}");
        }
    }
    out
}
