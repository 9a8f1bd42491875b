//! `signup activities`: print the catalog a server would start with.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;

use signup_core::Activity;

/// Print activities as a human-readable listing or as JSON.
///
/// The JSON shape is the same object `GET /activities` returns.
pub fn run_activities(activities: &BTreeMap<String, Activity>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(activities)?);
        return Ok(());
    }

    let mut out = String::new();
    write_activities(&mut out, activities)?;
    print!("{out}");
    Ok(())
}

fn write_activities(
    out: &mut impl fmt::Write,
    activities: &BTreeMap<String, Activity>,
) -> fmt::Result {
    if activities.is_empty() {
        return writeln!(out, "No activities.");
    }

    for (name, activity) in activities {
        let count = activity.participant_count();
        let max = activity.max_participants;
        if activity.is_over_capacity() {
            writeln!(out, "{name}  [{count}/{max}] (over capacity)")?;
        } else {
            writeln!(out, "{name}  [{count}/{max}]")?;
        }
        writeln!(out, "  {}", activity.description)?;
        writeln!(out, "  Schedule: {}", activity.schedule)?;
        if activity.participants.is_empty() {
            writeln!(out, "  Participants: none")?;
        } else {
            writeln!(out, "  Participants:")?;
            for email in &activity.participants {
                writeln!(out, "    - {email}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
