use crate::engine::Distributor;
use crate::error::{BudgetError, Result};
use crate::hours::{merge, HourEntry, HourKey, HourMap};
use crate::ingestion::ImportPreview;
use crate::lines::{build_lines, build_request, BudgetHeader};
use crate::schema::{
    CreateBudgetRequest, DistributionStrategy, EntryMode, FiscalConfig, LineItem, Period,
    StrategyKind,
};
use log::{debug, info, warn};

/// Editing state of a budget being created.
///
/// Project-level and per-element hours are held apart; only the map of the
/// active [`EntryMode`] is turned into lines.
///
/// Project-level hours are recomputed from the total on demand while a
/// shaping strategy is selected. The first direct edit or import freezes
/// them into [`DistributionStrategy::Custom`]; after that, changing the
/// total leaves the hours alone until a shaping strategy is selected again.
/// Per-element hours are only ever edited or imported.
#[derive(Debug, Clone)]
pub struct BudgetDraft {
    periods: Vec<Period>,
    mode: EntryMode,
    total: i64,
    strategy: DistributionStrategy,
    element_hours: HourMap,
}

impl BudgetDraft {
    pub fn new(periods: Vec<Period>) -> Result<Self> {
        if periods.is_empty() {
            return Err(BudgetError::InvalidArgument(
                "a budget draft needs at least one period".to_string(),
            ));
        }
        Ok(Self {
            periods,
            mode: EntryMode::Aggregate,
            total: 0,
            strategy: DistributionStrategy::Even,
            element_hours: HourMap::new(),
        })
    }

    pub fn from_config(config: &FiscalConfig) -> Result<Self> {
        Self::new(config.periods()?)
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    /// Switches the active map. Hours of the other mode are kept.
    pub fn set_mode(&mut self, mode: EntryMode) {
        self.mode = mode;
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn strategy(&self) -> &DistributionStrategy {
        &self.strategy
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Project-level hours: recomputed from the total under a shaping
    /// strategy, or the frozen map under `Custom`. Element keys of a custom
    /// map are ignored.
    pub fn aggregate_hours(&self) -> Result<HourMap> {
        let map = Distributor::new(&self.periods)?.distribute(&self.strategy, self.total)?;
        if map.iter().all(|(key, _)| key.element_id.is_none()) {
            return Ok(map);
        }
        let mut project = HourMap::new();
        for (key, hours) in map.iter().filter(|(key, _)| key.element_id.is_none()) {
            project.insert_unchecked(key.clone(), hours);
        }
        Ok(project)
    }

    pub fn element_hours(&self) -> &HourMap {
        &self.element_hours
    }

    /// Hours of the active entry mode.
    pub fn hours(&self) -> Result<HourMap> {
        match self.mode {
            EntryMode::Aggregate => self.aggregate_hours(),
            EntryMode::Element => Ok(self.element_hours.clone()),
        }
    }

    pub fn set_total(&mut self, total: i64) -> Result<()> {
        if total < 0 {
            return Err(BudgetError::InvalidArgument(format!(
                "total hours must not be negative, got {}",
                total
            )));
        }
        if self.strategy.is_custom() {
            debug!("Total set to {} while hours are custom; hours unchanged", total);
        }
        self.total = total;
        Ok(())
    }

    /// Selects a strategy for the project-level hours. Choosing a shaping
    /// strategy discards custom hours.
    pub fn set_strategy(&mut self, strategy: DistributionStrategy) {
        if self.strategy.is_custom() && !strategy.is_custom() {
            info!("Replacing custom hours with {:?} distribution", strategy.kind());
        }
        self.strategy = strategy;
    }

    /// Overwrites one entry. A key with an element id edits the per-element
    /// map; a project-level key freezes the project hours as custom.
    pub fn edit(&mut self, key: HourKey, hours: f64) -> Result<()> {
        if !self.periods.contains(&key.period) {
            return Err(BudgetError::InvalidArgument(format!(
                "period {} is outside the budget horizon",
                key.period
            )));
        }

        if key.element_id.is_some() {
            return self.element_hours.set(key, hours);
        }

        let mut map = self.aggregate_hours()?;
        map.set(key, hours)?;
        self.strategy = DistributionStrategy::Custom(map);
        Ok(())
    }

    /// Merges a previewed import and activates the mode of the sheet.
    ///
    /// A sheet with an element column adds onto the per-element hours; its
    /// rows that match no element are left out. A sheet without one adds
    /// onto the project-level hours and freezes them as custom. Importing
    /// the same preview twice adds its hours twice; call
    /// [`BudgetDraft::clear`] first to replace rather than accumulate.
    pub fn import(&mut self, preview: &ImportPreview) -> Result<()> {
        let outside = preview.periods_outside(&self.periods);
        if !outside.is_empty() {
            warn!(
                "Imported hours fall outside the budget horizon: {:?}",
                outside
            );
        }

        match preview.entry_mode() {
            EntryMode::Element => {
                let (matched, unmatched): (Vec<HourEntry>, Vec<HourEntry>) = preview
                    .entries()
                    .into_iter()
                    .partition(|entry| entry.element_id.is_some());
                if !unmatched.is_empty() {
                    let dropped: f64 = unmatched.iter().map(|entry| entry.hours).sum();
                    warn!(
                        "Left out {:.2} hours from rows matching no element",
                        dropped
                    );
                }
                self.element_hours = merge(&self.element_hours, &matched);
                self.mode = EntryMode::Element;
            }
            EntryMode::Aggregate => {
                let merged = preview.commit(&self.aggregate_hours()?);
                self.strategy = DistributionStrategy::Custom(merged);
                self.mode = EntryMode::Aggregate;
            }
        }
        Ok(())
    }

    /// Drops all hours of the active mode. Project-level hours become an
    /// empty custom map.
    pub fn clear(&mut self) {
        match self.mode {
            EntryMode::Aggregate => self.strategy = DistributionStrategy::Custom(HourMap::new()),
            EntryMode::Element => self.element_hours = HourMap::new(),
        }
    }

    pub fn lines(&self) -> Result<Vec<LineItem>> {
        Ok(build_lines(&self.hours()?))
    }

    pub fn to_request(&self, header: &BudgetHeader) -> Result<CreateBudgetRequest> {
        Ok(build_request(header, &self.hours()?))
    }
}
