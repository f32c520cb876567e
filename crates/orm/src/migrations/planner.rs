//! Migration Planner
//!
//! Pure functions from (catalog, current version, target) to an ordered plan.
//! Every step carries an explicit `previous` link, so a plan stays correct
//! when its window does not start at the first catalog entry.

use super::definitions::{
    Catalog, Direction, DowngradeTarget, MigrationPlan, PlanStep, UpgradeTarget,
};
use crate::error::{PlanError, PlanResult};

/// Plan an upgrade from `current` towards `target`.
///
/// Over-large step counts are clamped to the remaining migrations.
pub fn plan_upgrade(
    catalog: &Catalog,
    current: Option<&str>,
    target: UpgradeTarget,
) -> PlanResult<MigrationPlan> {
    let cursor = match current {
        None => 0,
        Some(version) => locate(catalog, version)? + 1,
    };

    let remaining = catalog.len() - cursor;
    let count = match target {
        UpgradeTarget::Head => remaining,
        UpgradeTarget::Steps(n) => n.min(remaining),
    };

    let migrations = catalog.migrations();
    let steps = (cursor..cursor + count)
        .map(|index| PlanStep {
            migration: migrations[index].clone(),
            direction: Direction::Up,
            previous: index.checked_sub(1).map(|prev| migrations[prev].clone()),
        })
        .collect();

    Ok(MigrationPlan {
        direction: Direction::Up,
        starting_version: current.map(str::to_string),
        steps,
    })
}

/// Plan a downgrade from `current` towards `target`.
///
/// With an empty ledger there is nothing to roll back and the plan is empty.
pub fn plan_downgrade(
    catalog: &Catalog,
    current: Option<&str>,
    target: DowngradeTarget,
) -> PlanResult<MigrationPlan> {
    let Some(version) = current else {
        return Ok(MigrationPlan::empty(Direction::Down, None));
    };

    let applied = locate(catalog, version)? + 1;
    let count = match target {
        DowngradeTarget::Base => applied,
        DowngradeTarget::Steps(n) => n.min(applied),
    };

    let migrations = catalog.migrations();
    let steps = (applied - count..applied)
        .rev()
        .map(|index| PlanStep {
            migration: migrations[index].clone(),
            direction: Direction::Down,
            previous: index.checked_sub(1).map(|prev| migrations[prev].clone()),
        })
        .collect();

    Ok(MigrationPlan {
        direction: Direction::Down,
        starting_version: Some(version.to_string()),
        steps,
    })
}

fn locate(catalog: &Catalog, version: &str) -> PlanResult<usize> {
    catalog
        .position(version)
        .ok_or_else(|| PlanError::VersionNotFound(version.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::definitions::Migration;

    fn catalog(versions: &[&str]) -> Catalog {
        Catalog::new(
            versions
                .iter()
                .map(|v| {
                    Migration::new(
                        *v,
                        format!("m{}", v),
                        format!("{}_m_up.sql", v),
                        format!("{}_m_down.sql", v),
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn summary(plan: &MigrationPlan) -> Vec<(String, Option<String>)> {
        plan.steps
            .iter()
            .map(|s| {
                (
                    s.migration.version.clone(),
                    s.previous.as_ref().map(|p| p.version.clone()),
                )
            })
            .collect()
    }

    fn pair(version: &str, previous: Option<&str>) -> (String, Option<String>) {
        (version.to_string(), previous.map(str::to_string))
    }

    #[test]
    fn test_upgrade_from_base_to_head() {
        let catalog = catalog(&["1", "2", "3"]);
        let plan = plan_upgrade(&catalog, None, UpgradeTarget::Head).unwrap();

        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(
            summary(&plan),
            vec![pair("1", None), pair("2", Some("1")), pair("3", Some("2"))]
        );
        assert_eq!(plan.final_version(), Some("3".to_string()));
    }

    #[test]
    fn test_upgrade_window_links_to_catalog_predecessor() {
        let catalog = catalog(&["1", "2", "3", "4"]);
        let plan = plan_upgrade(&catalog, Some("2"), UpgradeTarget::Steps(1)).unwrap();
        assert_eq!(summary(&plan), vec![pair("3", Some("2"))]);
    }

    #[test]
    fn test_upgrade_clamps_step_count() {
        let catalog = catalog(&["1", "2", "3"]);
        let plan = plan_upgrade(&catalog, Some("1"), UpgradeTarget::Steps(10)).unwrap();
        assert_eq!(plan.len(), 2);

        let plan = plan_upgrade(&catalog, None, UpgradeTarget::Steps(0)).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_upgrade_at_head_is_empty() {
        let catalog = catalog(&["1", "2"]);
        let plan = plan_upgrade(&catalog, Some("2"), UpgradeTarget::Head).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.final_version(), Some("2".to_string()));
    }

    #[test]
    fn test_upgrade_empty_catalog() {
        let plan = plan_upgrade(&Catalog::default(), None, UpgradeTarget::Head).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.final_version(), None);
    }

    #[test]
    fn test_unknown_current_version() {
        let catalog = catalog(&["1", "2"]);
        assert_eq!(
            plan_upgrade(&catalog, Some("7"), UpgradeTarget::Head).unwrap_err(),
            PlanError::VersionNotFound("7".to_string())
        );
        assert_eq!(
            plan_downgrade(&catalog, Some("7"), DowngradeTarget::Base).unwrap_err(),
            PlanError::VersionNotFound("7".to_string())
        );
    }

    #[test]
    fn test_downgrade_to_base() {
        let catalog = catalog(&["1", "2", "3"]);
        let plan = plan_downgrade(&catalog, Some("2"), DowngradeTarget::Base).unwrap();

        assert_eq!(plan.direction, Direction::Down);
        assert_eq!(summary(&plan), vec![pair("2", Some("1")), pair("1", None)]);
        assert_eq!(plan.final_version(), None);
    }

    #[test]
    fn test_downgrade_steps_clamped_at_first() {
        let catalog = catalog(&["1", "2", "3"]);

        let plan = plan_downgrade(&catalog, Some("3"), DowngradeTarget::Steps(1)).unwrap();
        assert_eq!(summary(&plan), vec![pair("3", Some("2"))]);
        assert_eq!(plan.final_version(), Some("2".to_string()));

        let plan = plan_downgrade(&catalog, Some("2"), DowngradeTarget::Steps(5)).unwrap();
        assert_eq!(summary(&plan), vec![pair("2", Some("1")), pair("1", None)]);

        let plan = plan_downgrade(&catalog, Some("2"), DowngradeTarget::Steps(0)).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_downgrade_empty_ledger_is_noop() {
        let catalog = catalog(&["1", "2"]);
        let plan = plan_downgrade(&catalog, None, DowngradeTarget::Base).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.final_version(), None);
    }

    #[test]
    fn test_upgrade_head_reaches_fixed_point() {
        let catalog = catalog(&["1", "2", "3", "4"]);
        for start in [None, Some("1"), Some("3"), Some("4")] {
            let plan = plan_upgrade(&catalog, start, UpgradeTarget::Head).unwrap();
            let end = plan.final_version();
            let replanned = plan_upgrade(&catalog, end.as_deref(), UpgradeTarget::Head).unwrap();
            assert!(replanned.is_empty(), "not converged from {:?}", start);
        }
    }
}
