use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical form used to compare plan names: lower case, trimmed, single spaces.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub allowed: bool,
    pub conflict_id: Option<Uuid>,
}

/// Checks a candidate name against the user's plans of one kind. The plan
/// being edited (`exclude_id`) never conflicts with itself.
pub fn resolve<'a, P>(existing: P, candidate: &str, exclude_id: Option<Uuid>) -> Resolution
where
    P: IntoIterator<Item = (Uuid, &'a str)>,
{
    let wanted = normalize_name(candidate);
    let conflict_id = existing
        .into_iter()
        .filter(|(id, _)| Some(*id) != exclude_id)
        .find(|(_, name)| normalize_name(name) == wanted)
        .map(|(id, _)| id);
    Resolution {
        allowed: conflict_id.is_none(),
        conflict_id,
    }
}

/// What an import does when the incoming name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    #[default]
    Reject,
    Prefix,
    Replace,
}

impl FromStr for DuplicateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DuplicateStrategy::Reject),
            "prefix" => Ok(DuplicateStrategy::Prefix),
            "replace" => Ok(DuplicateStrategy::Replace),
            other => Err(format!("unknown duplicate strategy '{other}'")),
        }
    }
}

/// Outcome of applying a strategy to an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportAction {
    /// Store as a new plan under this name.
    Insert { name: String },
    /// Overwrite the plan with this id.
    Replace { id: Uuid },
    /// Name is taken and the caller asked to reject.
    Reject { conflict_id: Uuid },
}

/// Decides how an imported plan named `candidate` gets stored. With `Prefix`
/// the prefix is prepended again for as long as the result is still taken.
pub fn plan_import<'a, P>(
    existing: P,
    candidate: &str,
    strategy: DuplicateStrategy,
    prefix: &str,
) -> ImportAction
where
    P: IntoIterator<Item = (Uuid, &'a str)>,
    P::IntoIter: Clone,
{
    let existing = existing.into_iter();
    let Some(conflict_id) = resolve(existing.clone(), candidate, None).conflict_id else {
        return ImportAction::Insert {
            name: candidate.to_string(),
        };
    };
    match strategy {
        DuplicateStrategy::Reject => ImportAction::Reject { conflict_id },
        DuplicateStrategy::Replace => ImportAction::Replace { id: conflict_id },
        DuplicateStrategy::Prefix => {
            let mut name = format!("{prefix}{candidate}");
            while !resolve(existing.clone(), &name, None).allowed {
                name = format!("{prefix}{name}");
            }
            ImportAction::Insert { name }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans(names: &[&'static str]) -> Vec<(Uuid, &'static str)> {
        names.iter().map(|n| (Uuid::new_v4(), *n)).collect()
    }

    #[test]
    fn normalization_ignores_case_and_spacing() {
        assert_eq!(normalize_name("My Plan"), "my plan");
        assert_eq!(normalize_name(" my   plan "), "my plan");
        assert_eq!(normalize_name("MY PLAN"), "my plan");
        assert_eq!(normalize_name("my\tplan"), "my plan");
    }

    #[test]
    fn any_normalized_match_blocks_creation() {
        let existing = plans(&["Leg Day", "Push"]);
        let res = resolve(existing.iter().copied(), "leg   day", None);
        assert!(!res.allowed);
        assert_eq!(res.conflict_id, Some(existing[0].0));

        let res = resolve(existing.iter().copied(), "Pull", None);
        assert!(res.allowed);
        assert_eq!(res.conflict_id, None);
    }

    #[test]
    fn editing_under_own_name_is_allowed() {
        let existing = plans(&["Leg Day"]);
        let own = existing[0].0;
        let res = resolve(existing.iter().copied(), "LEG DAY", Some(own));
        assert!(res.allowed);
    }

    #[test]
    fn editing_into_another_plans_name_conflicts() {
        let existing = plans(&["Leg Day", "Arms"]);
        let res = resolve(existing.iter().copied(), "arms", Some(existing[0].0));
        assert_eq!(res.conflict_id, Some(existing[1].0));
    }

    #[test]
    fn import_strategies() {
        let existing = plans(&["Leg Day"]);
        let conflict = existing[0].0;

        assert_eq!(
            plan_import(existing.iter().copied(), "leg day", DuplicateStrategy::Reject, "Copy - "),
            ImportAction::Reject { conflict_id: conflict }
        );
        assert_eq!(
            plan_import(existing.iter().copied(), "leg day", DuplicateStrategy::Replace, "Copy - "),
            ImportAction::Replace { id: conflict }
        );
        assert_eq!(
            plan_import(existing.iter().copied(), "Leg Day", DuplicateStrategy::Prefix, "Copy - "),
            ImportAction::Insert { name: "Copy - Leg Day".into() }
        );
        assert_eq!(
            plan_import(existing.iter().copied(), "Arms", DuplicateStrategy::Reject, "Copy - "),
            ImportAction::Insert { name: "Arms".into() }
        );
    }

    #[test]
    fn prefix_repeats_until_free() {
        let existing = plans(&["Leg Day", "Copy - Leg Day"]);
        assert_eq!(
            plan_import(existing.iter().copied(), "Leg Day", DuplicateStrategy::Prefix, "Copy - "),
            ImportAction::Insert { name: "Copy - Copy - Leg Day".into() }
        );
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("PREFIX".parse::<DuplicateStrategy>(), Ok(DuplicateStrategy::Prefix));
        assert!("merge".parse::<DuplicateStrategy>().is_err());
    }
}
