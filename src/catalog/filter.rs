use super::dto::{ExerciseFilter, ExerciseRecord, ExerciseSnapshot};

fn matches(value: &str, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(w) => value.trim().eq_ignore_ascii_case(w),
    }
}

/// Exercises from the snapshot matching every set criterion, case-insensitively.
pub fn filter_exercises(snapshot: &ExerciseSnapshot, filter: &ExerciseFilter) -> Vec<ExerciseRecord> {
    snapshot
        .exercises
        .iter()
        .filter(|e| {
            matches(&e.body_part, filter.body_part.as_deref())
                && matches(&e.equipment, filter.equipment.as_deref())
                && matches(&e.target, filter.target.as_deref())
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::model::tests::exercise;

    fn snapshot() -> ExerciseSnapshot {
        let mut curl = exercise("0031", "barbell curl");
        curl.body_part = "upper arms".into();
        curl.target = "biceps".into();
        let mut goblet = exercise("1760", "dumbbell goblet squat");
        goblet.equipment = "dumbbell".into();
        ExerciseSnapshot {
            exercises: vec![exercise("0043", "barbell full squat"), curl, goblet],
            ..Default::default()
        }
    }

    #[test]
    fn empty_filter_returns_everything() {
        assert_eq!(filter_exercises(&snapshot(), &ExerciseFilter::default()).len(), 3);
    }

    #[test]
    fn criteria_combine_and_ignore_case() {
        let filter = ExerciseFilter {
            body_part: Some("Upper Legs".into()),
            equipment: Some("BARBELL".into()),
            target: None,
        };
        let found = filter_exercises(&snapshot(), &filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "0043");
    }

    #[test]
    fn blank_criteria_are_ignored() {
        let filter = ExerciseFilter {
            target: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(filter_exercises(&snapshot(), &filter).len(), 3);
    }
}
