use shared::domain::{FilterCriteria, University};

/// Keeps the candidates matching every predicate of `criteria`, in input order.
pub fn apply(candidates: &[University], criteria: &FilterCriteria) -> Vec<University> {
    candidates
        .iter()
        .filter(|candidate| retains(candidate, criteria))
        .cloned()
        .collect()
}

pub fn retains(candidate: &University, criteria: &FilterCriteria) -> bool {
    let ranking_ok = candidate
        .ranking
        .map_or(true, |rank| (criteria.min_ranking..=criteria.max_ranking).contains(&rank));
    let tuition_ok = criteria.min_tuition <= candidate.tuition_fee
        && candidate.tuition_fee <= criteria.max_tuition;
    let country_ok = selector(criteria.country.as_deref())
        .map_or(true, |country| same_text(country, &candidate.country));
    let program_ok = selector(criteria.program_type.as_deref()).map_or(true, |program| {
        candidate
            .top_programs
            .iter()
            .any(|offered| same_text(program, offered))
    });
    let scholarship_ok = !criteria.scholarship_only || candidate.scholarship_available;
    let chance_ok = candidate
        .admission_chance
        .map_or(true, |chance| chance >= criteria.min_admission_chance);

    ranking_ok && tuition_ok && country_ok && program_ok && scholarship_ok && chance_ok
}

fn selector(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn same_text(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::university;

    fn candidates() -> Vec<University> {
        let mut tum = university("TU Munich", "Germany", 3000.0);
        tum.ranking = Some(37);
        tum.top_programs = vec!["Engineering".into(), "Informatics".into()];
        tum.admission_chance = Some(40.0);

        let mut delft = university("TU Delft", "Netherlands", 14000.0);
        delft.ranking = Some(47);
        delft.top_programs = vec!["Aerospace".into()];
        delft.scholarship_available = true;
        delft.admission_chance = Some(70.0);

        let mut unranked = university("Hochschule Rhein", "germany", 500.0);
        unranked.top_programs = vec!["engineering".into()];

        let mut eth = university("ETH Zurich", "Switzerland", 60000.0);
        eth.ranking = Some(7);
        eth.scholarship_available = true;

        vec![tum, delft, unranked, eth]
    }

    fn names(list: &[University]) -> Vec<&str> {
        list.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn default_criteria_is_identity() {
        let input = candidates();
        assert_eq!(apply(&input, &FilterCriteria::default()), input);
    }

    #[test]
    fn filtering_is_idempotent() {
        let input = candidates();
        let criteria_set = [
            FilterCriteria::panel_defaults(),
            FilterCriteria {
                country: Some("GERMANY".into()),
                ..FilterCriteria::default()
            },
            FilterCriteria {
                scholarship_only: true,
                min_admission_chance: 50.0,
                ..FilterCriteria::default()
            },
            FilterCriteria {
                min_ranking: 10,
                max_ranking: 40,
                max_tuition: 5000.0,
                ..FilterCriteria::default()
            },
        ];
        for criteria in &criteria_set {
            let once = apply(&input, criteria);
            assert_eq!(apply(&once, criteria), once, "criteria: {criteria:?}");
        }
    }

    #[test]
    fn country_and_program_match_case_insensitively() {
        let criteria = FilterCriteria {
            country: Some(" germany ".into()),
            program_type: Some("ENGINEERING".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(
            names(&apply(&candidates(), &criteria)),
            vec!["TU Munich", "Hochschule Rhein"]
        );
    }

    #[test]
    fn blank_selectors_are_ignored() {
        let criteria = FilterCriteria {
            country: Some("   ".into()),
            program_type: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&candidates(), &criteria).len(), 4);
    }

    #[test]
    fn unranked_candidates_pass_ranking_bounds() {
        let criteria = FilterCriteria {
            min_ranking: 40,
            max_ranking: 50,
            ..FilterCriteria::default()
        };
        assert_eq!(
            names(&apply(&candidates(), &criteria)),
            vec!["TU Delft", "Hochschule Rhein"]
        );
    }

    #[test]
    fn tuition_bounds_are_inclusive() {
        let criteria = FilterCriteria {
            min_tuition: 3000.0,
            max_tuition: 14000.0,
            ..FilterCriteria::default()
        };
        assert_eq!(
            names(&apply(&candidates(), &criteria)),
            vec!["TU Munich", "TU Delft"]
        );
    }

    #[test]
    fn scholarship_and_chance_thresholds() {
        let criteria = FilterCriteria {
            scholarship_only: true,
            min_admission_chance: 50.0,
            ..FilterCriteria::default()
        };
        // ETH has no admission chance, so the threshold does not exclude it.
        assert_eq!(
            names(&apply(&candidates(), &criteria)),
            vec!["TU Delft", "ETH Zurich"]
        );
    }

    #[test]
    fn panel_defaults_drop_expensive_candidates() {
        assert_eq!(
            names(&apply(&candidates(), &FilterCriteria::panel_defaults())),
            vec!["TU Munich", "TU Delft", "Hochschule Rhein"]
        );
    }
}
