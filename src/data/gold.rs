//! Gold data: subject records joined with their place coordinates.

use tracing::info;

use crate::data::dataset::Dataset;
use crate::data::table::Table;
use crate::error::{Error, Result};

pub struct GoldDataBuilder<'a> {
    subject: &'a Dataset,
    localizations: &'a Dataset,
    located_data: Option<Table>,
}

impl<'a> GoldDataBuilder<'a> {
    pub fn new(subject: &'a Dataset, localizations: &'a Dataset) -> GoldDataBuilder<'a> {
        GoldDataBuilder {
            subject,
            localizations,
            located_data: None,
        }
    }

    pub fn subject(&self) -> &Dataset {
        self.subject
    }

    /// Left join of the subject on the localizations' place column. Unmatched rows keep
    /// null coordinates; join fan-out is not deduplicated here.
    pub fn add_locations(&mut self) -> Result<&Table> {
        let left_on = self.subject.place_column().ok_or_else(|| Error::InvalidState {
            operation: "locate a dataset without place column",
            state: self.subject.state().clone(),
        })?;
        let right_on = self
            .localizations
            .place_column()
            .ok_or_else(|| Error::MissingColumn("place".to_string()))?;

        let located = self
            .subject
            .data()
            .left_join(self.localizations.data(), left_on, right_on)?;
        info!(
            subject = self.subject.name(),
            rows = located.len(),
            cols = located.columns().len(),
            "added locations"
        );
        Ok(self.located_data.insert(located))
    }

    /// Remove repeated rows produced by the join, if any.
    pub fn drop_duplicates(&mut self) {
        if let Some(table) = self.located_data.as_mut() {
            table.drop_duplicates();
        }
    }

    pub fn located_data(&self) -> Option<&Table> {
        self.located_data.as_ref()
    }

    pub fn into_located_data(self) -> Option<Table> {
        self.located_data
    }
}
