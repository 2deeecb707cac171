//! District → school search pair / 学区 → 学校 级联搜索
//!
//! The district controller owns the dependency link; the school controller
//! only hears about it. Picking a different district wipes the school
//! keyword and selection and starts a fresh school search for that district.

use serde::Serialize;

use super::controller::{ControllerOptions, ControllerSnapshot, SearchController};
use super::source::SearchSource;
use crate::models::Entity;

#[derive(Debug, Clone, Serialize)]
pub struct FinderSnapshot {
    pub district: ControllerSnapshot,
    pub school: ControllerSnapshot,
}

pub struct SchoolFinder<D: SearchSource, S: SearchSource> {
    district: SearchController<D>,
    school: SearchController<S>,
}

impl<D: SearchSource, S: SearchSource> SchoolFinder<D, S> {
    pub fn new(district_source: D, school_source: S, options: ControllerOptions) -> Self {
        let district = SearchController::new(district_source, options.clone());
        let school = SearchController::new(school_source, options);
        district.attach_child(&school);
        Self { district, school }
    }

    pub fn district(&self) -> &SearchController<D> {
        &self.district
    }

    pub fn school(&self) -> &SearchController<S> {
        &self.school
    }

    /// Select the `index`-th district option / 按序号选择学区
    pub fn pick_district(&self, index: usize) -> Option<Entity> {
        let picked = self.district.results().into_iter().nth(index)?;
        self.district.on_change(Some(picked.clone()));
        Some(picked)
    }

    /// Select the `index`-th school option / 按序号选择学校
    pub fn pick_school(&self, index: usize) -> Option<Entity> {
        let picked = self.school.results().into_iter().nth(index)?;
        self.school.on_change(Some(picked.clone()));
        Some(picked)
    }

    pub fn snapshot(&self) -> FinderSnapshot {
        FinderSnapshot {
            district: self.district.snapshot(),
            school: self.school.snapshot(),
        }
    }

    pub fn shutdown(&self) {
        self.district.shutdown();
        self.school.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::search::events::{ControllerEvent, SearchPhase};
    use crate::search::source::FetchGate;
    use crate::search::testing::{entities, settle, Call, ScriptedSource};

    const QUIET: Duration = Duration::from_millis(600);

    fn finder(
        district: &ScriptedSource,
        school: &ScriptedSource,
    ) -> SchoolFinder<ScriptedSource, ScriptedSource> {
        SchoolFinder::new(district.clone(), school.clone(), ControllerOptions::default())
    }

    fn sources() -> (ScriptedSource, ScriptedSource) {
        (
            ScriptedSource::auto("district", FetchGate::NonEmptyKeyword),
            ScriptedSource::auto("school", FetchGate::Dependency),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_flow() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        for keyword in ["P", "Pen", "Peninsula"] {
            finder
                .district()
                .on_input_change(keyword, crate::search::InputAction::InputChange);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tokio::time::sleep(QUIET).await;
        assert_eq!(districts.calls(), vec![Call::new("Peninsula", None)]);
        assert!(schools.calls().is_empty());

        finder.district().on_change(Some(Entity::new("LEA123", "Peninsula Unified")));
        tokio::time::sleep(QUIET).await;
        assert_eq!(schools.calls(), vec![Call::new("", Some("LEA123"))]);
        assert_eq!(finder.school().dependency().as_deref(), Some("LEA123"));

        finder.school().set_keyword("k");
        tokio::time::sleep(QUIET).await;
        assert_eq!(schools.calls().len(), 2);
        assert_eq!(schools.calls()[1], Call::new("k", Some("LEA123")));

        let picked = finder.pick_school(0).unwrap();
        assert_eq!(picked, entities("k", 3)[0]);

        // More district typing leaves the school selection alone
        finder.district().set_keyword("Penin");
        tokio::time::sleep(QUIET).await;
        assert_eq!(finder.school().selection(), Some(picked));

        finder.district().on_change(Some(Entity::new("LEA999", "Other")));
        assert!(finder.school().selection().is_none());
        assert_eq!(finder.school().keyword(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_change_resets_child() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        finder.school().set_keyword("math");
        tokio::time::sleep(QUIET).await;
        finder.school().on_change(Some(Entity::new("S1", "Math Academy")));

        finder.district().on_change(Some(Entity::new("D2", "District Two")));
        assert_eq!(finder.school().keyword(), "");
        assert!(finder.school().selection().is_none());
        assert!(finder.school().value().is_none());
        assert_eq!(finder.school().phase(), SearchPhase::Pending);

        tokio::time::sleep(QUIET).await;
        assert_eq!(schools.calls().last(), Some(&Call::new("", Some("D2"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_child_results_are_broadcast() {
        let (districts, schools) = sources();
        let options = ControllerOptions { clear_stale_results: true, ..Default::default() };
        let finder = SchoolFinder::new(districts.clone(), schools.clone(), options);

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        tokio::time::sleep(QUIET).await;
        assert_eq!(finder.school().results().len(), 3);

        let mut events = finder.school().subscribe();
        finder.district().on_change(Some(Entity::new("D2", "District Two")));
        assert!(finder.school().results().is_empty());

        let mut cleared = false;
        while let Ok(event) = events.try_recv() {
            if let ControllerEvent::ResultsChanged { options, .. } = event {
                assert!(options.is_empty());
                cleared = true;
            }
        }
        assert!(cleared);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselecting_same_district_keeps_child() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        finder.school().set_keyword("math");
        tokio::time::sleep(QUIET).await;
        finder.school().on_change(Some(Entity::new("S1", "Math Academy")));
        let calls = schools.calls().len();

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        tokio::time::sleep(QUIET).await;
        assert_eq!(finder.school().keyword(), "math");
        assert_eq!(finder.school().selection(), Some(Entity::new("S1", "Math Academy")));
        assert_eq!(schools.calls().len(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_school_fetch_without_district() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        for keyword in ["", "lincoln", "high"] {
            finder.school().set_keyword(keyword);
            tokio::time::sleep(QUIET).await;
        }
        assert!(schools.calls().is_empty());
        assert_eq!(finder.school().phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_district_disables_school_search() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        tokio::time::sleep(QUIET).await;
        assert_eq!(schools.calls().len(), 1);

        finder.district().on_change(None);
        assert!(finder.school().dependency().is_none());
        finder.school().set_keyword("lincoln");
        tokio::time::sleep(QUIET).await;
        assert_eq!(schools.calls().len(), 1);
        assert_eq!(finder.school().phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_district_results_never_reach_new_district() {
        let districts = ScriptedSource::auto("district", FetchGate::NonEmptyKeyword);
        let schools = ScriptedSource::manual("school", FetchGate::Dependency);
        let finder = finder(&districts, &schools);

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        tokio::time::sleep(QUIET).await;
        assert_eq!(finder.school().phase(), SearchPhase::Fetching);

        finder.district().on_change(Some(Entity::new("D2", "District Two")));
        schools.resolve(0, Ok(entities("d1-school", 4)));
        settle().await;
        assert!(finder.school().results().is_empty());

        tokio::time::sleep(QUIET).await;
        schools.resolve(1, Ok(entities("d2-school", 2)));
        settle().await;
        assert_eq!(finder.school().results(), entities("d2-school", 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_controllers_debounce_independently() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        finder.district().on_change(Some(Entity::new("D1", "District One")));
        finder.district().set_keyword("pen");
        tokio::time::sleep(Duration::from_millis(300)).await;
        finder.school().set_keyword("k");
        tokio::time::sleep(QUIET).await;

        assert_eq!(districts.calls(), vec![Call::new("pen", None)]);
        assert_eq!(schools.calls(), vec![Call::new("k", Some("D1"))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pick_out_of_range() {
        let (districts, schools) = sources();
        let finder = finder(&districts, &schools);

        assert!(finder.pick_district(0).is_none());
        finder.district().set_keyword("pen");
        tokio::time::sleep(QUIET).await;
        assert!(finder.pick_district(5).is_none());
        assert_eq!(finder.pick_district(2), Some(entities("pen", 3)[2].clone()));
        assert_eq!(finder.snapshot().school.dependency.as_deref(), Some("pen-2"));
    }
}
