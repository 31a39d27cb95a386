//! The row mapping entry point.

use std::any;
use std::sync::Arc;

use super::class_map::{AutoMap, ClassMap};
use super::observer::{MappingObserver, MappingSeverity, RowContext};
use super::registry::ClassMapRegistry;
use crate::error::{MappingError, MappingResult};
use crate::types::{RawCellSource, Sheet};

/// Maps rows into typed values.
///
/// A mapper owns (a handle to) a [`ClassMapRegistry`], so maps are built once and reused for
/// every row. Cloning a mapper shares the registry and observer.
#[derive(Clone)]
pub struct RowMapper {
    registry: Arc<ClassMapRegistry>,
    observer: Option<Arc<dyn MappingObserver>>,
    alert_at_or_above: MappingSeverity,
}

impl Default for RowMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RowMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowMapper")
            .field("registry", &self.registry)
            .field("has_observer", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl RowMapper {
    /// A mapper with its own empty registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ClassMapRegistry::new()))
    }

    /// A mapper that shares `registry`.
    pub fn with_registry(registry: Arc<ClassMapRegistry>) -> Self {
        Self {
            registry,
            observer: None,
            alert_at_or_above: MappingSeverity::Critical,
        }
    }

    /// Report every row outcome to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn MappingObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Failures at or above `severity` are also sent to [`MappingObserver::on_alert`].
    /// Defaults to [`MappingSeverity::Critical`].
    pub fn alert_at_or_above(mut self, severity: MappingSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    pub fn registry(&self) -> &Arc<ClassMapRegistry> {
        &self.registry
    }

    /// Map one row with the registered (or automatically built) map for `T`.
    pub fn map_row<T: AutoMap>(&self, row: &dyn RawCellSource) -> MappingResult<T> {
        let map = self.class_map::<T>(row.row_number())?;
        self.map_row_with(&map, row)
    }

    /// Map one row with an explicit map.
    pub fn map_row_with<T: Default + 'static>(
        &self,
        map: &ClassMap<T>,
        row: &dyn RawCellSource,
    ) -> MappingResult<T> {
        let result = map.map_row(row);
        self.report::<T>(row.row_number(), &result);
        result
    }

    /// Map every data row of `sheet`, in order.
    ///
    /// Building the map happens up front; after that each row yields its own result, so one bad
    /// row does not stop the rest.
    pub fn map_sheet<'a, T: AutoMap>(
        &'a self,
        sheet: &'a Sheet,
    ) -> MappingResult<impl Iterator<Item = MappingResult<T>> + 'a> {
        let map = self.class_map::<T>(0)?;
        Ok(sheet.rows().map(move |row| self.map_row_with(&map, &row)))
    }

    /// Map every data row of `sheet` with an explicit map.
    pub fn map_sheet_with<'a, T: Default + 'static>(
        &'a self,
        map: &'a ClassMap<T>,
        sheet: &'a Sheet,
    ) -> impl Iterator<Item = MappingResult<T>> + 'a {
        sheet.rows().map(move |row| self.map_row_with(map, &row))
    }

    /// Map one row with the map registered for `T` through [`ClassMapRegistry::register`].
    ///
    /// Unlike [`RowMapper::map_row`], `T` need not implement [`AutoMap`]; a type with no map fails
    /// with [`MappingError::MapNotRegistered`].
    pub fn map_registered<T: Default + 'static>(&self, row: &dyn RawCellSource) -> MappingResult<T> {
        let map = self.registered_map::<T>(row.row_number())?;
        self.map_row_with(&map, row)
    }

    /// Map every data row of `sheet` with the map registered for `T`.
    pub fn map_sheet_registered<'a, T: Default + 'static>(
        &'a self,
        sheet: &'a Sheet,
    ) -> MappingResult<impl Iterator<Item = MappingResult<T>> + 'a> {
        let map = self.registered_map::<T>(0)?;
        Ok(sheet.rows().map(move |row| self.map_row_with(&map, &row)))
    }

    fn registered_map<T: 'static>(&self, row: usize) -> MappingResult<Arc<ClassMap<T>>> {
        self.registry.get::<T>().ok_or_else(|| {
            let error = MappingError::MapNotRegistered {
                type_name: any::type_name::<T>().to_string(),
            };
            self.report_failure::<T>(row, &error);
            error
        })
    }

    fn class_map<T: AutoMap>(&self, row: usize) -> MappingResult<Arc<ClassMap<T>>> {
        let result = self.registry.get_or_build::<T>();
        if let Err(e) = &result {
            self.report_failure::<T>(row, e);
        }
        result
    }

    fn report<T>(&self, row: usize, result: &MappingResult<T>) {
        match result {
            Ok(_) => {
                if let Some(observer) = &self.observer {
                    observer.on_row_mapped(&RowContext {
                        row,
                        target_type: any::type_name::<T>(),
                    });
                }
            }
            Err(e) => self.report_failure::<T>(row, e),
        }
    }

    fn report_failure<T>(&self, row: usize, error: &MappingError) {
        let severity = MappingSeverity::of(error);
        tracing::debug!(row, target_type = any::type_name::<T>(), ?severity, error = %error, "row mapping failed");
        let Some(observer) = &self.observer else {
            return;
        };
        let ctx = RowContext {
            row,
            target_type: any::type_name::<T>(),
        };
        observer.on_row_failed(&ctx, severity, error);
        if severity >= self.alert_at_or_above {
            observer.on_alert(&ctx, severity, error);
        }
    }
}
