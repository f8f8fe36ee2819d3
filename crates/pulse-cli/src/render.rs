//! Terminal and JSON output

use anyhow::Result;
use pulse_core::{FeedStatus, SessionState};
use pulse_ledger::EffectiveSummary;
use pulse_model::{Action, ConversationMessage, Role, StoreMeta};
use pulse_scenario::{ScenarioConfig, ScenarioKpis};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView<'a> {
    store: Option<&'a StoreMeta>,
    status: FeedStatus,
    effective: Option<EffectiveSummary>,
    actionable: Vec<&'a Action>,
    conversation: Vec<&'a ConversationMessage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfView<'a> {
    store: Option<&'a StoreMeta>,
    config: &'a ScenarioConfig,
    kpis: Option<&'a ScenarioKpis>,
}

fn pct(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Store header, effective metrics, actionable queue and conversation
pub(crate) fn session(state: &SessionState, json: bool) -> Result<String> {
    if json {
        let view = SessionView {
            store: state.meta(),
            status: state.status(),
            effective: state.effective_summary(),
            actionable: state.catalog().actionable(),
            conversation: state.recent_conversation(),
        };
        return Ok(serde_json::to_string_pretty(&view)?);
    }

    let mut out = String::new();
    header(&mut out, state)?;

    if let (Some(baseline), Some(effective)) = (state.baseline(), state.effective_summary()) {
        writeln!(
            out,
            "Capacity {} -> {}, health {} -> {}, on hand {} -> {}",
            pct(baseline.capacity_pct),
            pct(effective.capacity_pct),
            baseline.inventory_health(),
            effective.inventory_health,
            baseline.on_hand,
            effective.on_hand
        )?;
        writeln!(out, "Category mix:")?;
        for (name, share) in baseline.categories.iter() {
            let now = effective.categories.get(name).unwrap_or(0.0);
            writeln!(out, "  {name:<12} {:>6.1}% -> {:>5.1}%", share * 100.0, now * 100.0)?;
        }
    }

    let actionable = state.catalog().actionable();
    if !actionable.is_empty() {
        writeln!(out, "Actionable:")?;
        for action in actionable {
            writeln!(
                out,
                "  [{}] {}: {} ({})",
                action.severity,
                action.title,
                action.describe_shift(),
                action.id
            )?;
        }
    }

    let conversation = state.recent_conversation();
    if !conversation.is_empty() {
        writeln!(out, "Conversation:")?;
        for message in conversation {
            writeln!(out, "  {}: {}", speaker(message.role), message.text)?;
        }
    }
    Ok(out)
}

/// Scenario knobs and projected KPIs
pub(crate) fn what_if(state: &SessionState, json: bool) -> Result<String> {
    let config = state.what_if().config();
    let kpis = state.scenario_kpis();
    if json {
        let view = WhatIfView {
            store: state.meta(),
            config,
            kpis,
        };
        return Ok(serde_json::to_string_pretty(&view)?);
    }

    let mut out = String::new();
    header(&mut out, state)?;
    writeln!(
        out,
        "Scenario: {} sqft mezzanine, ${:.0} budget, staffing {}, receiving {}x/week, {} bays, {} uplift",
        config.mezzanine_sqft,
        config.add_budget,
        if config.constraints.staffing_ok { "ok" } else { "short" },
        config.constraints.receiving_xpw,
        config.constraints.bays,
        config.uplift_preset
    )?;
    match kpis {
        Some(kpis) => {
            writeln!(out, "Revenue        ${:.0}", kpis.revenue)?;
            writeln!(out, "Avg inventory  {:.0}", kpis.avg_inventory)?;
            writeln!(out, "Turns          {:.2}", kpis.turns)?;
            writeln!(out, "Capacity       {}", pct(kpis.capacity_pct))?;
            writeln!(out, "On hand        {}", kpis.on_hand)?;
        }
        None => writeln!(out, "No baseline yet; nothing to project.")?,
    }
    Ok(out)
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::Agent => "agent",
        Role::User => "you",
        Role::System => "system",
    }
}

fn header(out: &mut String, state: &SessionState) -> Result<()> {
    match state.meta() {
        Some(meta) => writeln!(
            out,
            "Store: {} ({}), status {}",
            meta.label(),
            meta.id,
            state.status()
        )?,
        None => writeln!(out, "Store: none, status {}", state.status())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulse_core::{reduce, Command, PulseConfig};
    use pulse_scenario::ScenarioPreset;
    use pulse_test_utils::{fixed_time, sample_action, sample_snapshot};

    fn loaded() -> SessionState {
        let now = fixed_time();
        let mut state = SessionState::new(&PulseConfig::default());
        reduce(
            &mut state,
            Command::BeginSession {
                store_id: "ATL_050".into(),
            },
            now,
        );
        let mut snapshot = sample_snapshot("ATL_050");
        snapshot.actions = vec![sample_action("act-1", 10.0)];
        reduce(&mut state, Command::IngestSnapshot(snapshot), now);
        reduce(&mut state, Command::Complete, now);
        state
    }

    #[test]
    fn session_text_lists_metrics_and_queue() {
        let text = session(&loaded(), false).unwrap();
        assert!(text.starts_with("Store: Test ATL_050 (ATL_050), status complete\n"));
        assert!(text.contains("Capacity 105% -> 105%, health 75 -> 75, on hand 10000 -> 10000"));
        assert!(text.contains(
            "  [high] Rebalance Batteries into Wipers (act-1): 10% from Batteries to Wipers (act-1)"
        ));
        assert!(text.contains("  agent: Capacity is running hot."));
    }

    #[test]
    fn session_json_is_structured() {
        let json: serde_json::Value =
            serde_json::from_str(&session(&loaded(), true).unwrap()).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["actionable"][0]["id"], "act-1");
        assert_eq!(json["store"]["id"], "ATL_050");
        assert_eq!(json["effective"]["onHand"], 10_000);
    }

    #[test]
    fn what_if_text_shows_projection() {
        let mut state = loaded();
        reduce(&mut state, Command::ApplyPreset(ScenarioPreset::Mezzanine), fixed_time());
        let text = what_if(&state, false).unwrap();
        assert!(text.contains(
            "1000 sqft mezzanine, $50000 budget, staffing ok, receiving 2x/week, 8 bays, base uplift"
        ));
        assert!(text.contains("Turns"));
    }

    #[test]
    fn what_if_without_baseline_says_so() {
        let state = SessionState::new(&PulseConfig::default());
        let text = what_if(&state, false).unwrap();
        assert_eq!(
            text,
            "Store: none, status idle\n\
             Scenario: 0 sqft mezzanine, $0 budget, staffing ok, receiving 3x/week, 0 bays, base uplift\n\
             No baseline yet; nothing to project.\n"
        );
    }
}
