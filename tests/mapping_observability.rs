use std::sync::{Arc, Mutex};

use sheet_mapper::mapping::{
    AutoMap, AutoMapper, CompositeObserver, MappingObserver, MappingSeverity, RowContext,
    RowMapper, TracingObserver,
};
use sheet_mapper::types::Sheet;
use sheet_mapper::MappingError;

#[derive(Default)]
struct RecordingObserver {
    mapped: Mutex<Vec<usize>>,
    failures: Mutex<Vec<(usize, MappingSeverity)>>,
    alerts: Mutex<Vec<MappingSeverity>>,
}

impl MappingObserver for RecordingObserver {
    fn on_row_mapped(&self, ctx: &RowContext) {
        self.mapped.lock().unwrap().push(ctx.row);
    }

    fn on_row_failed(&self, ctx: &RowContext, severity: MappingSeverity, _error: &MappingError) {
        self.failures.lock().unwrap().push((ctx.row, severity));
    }

    fn on_alert(&self, _ctx: &RowContext, severity: MappingSeverity, _error: &MappingError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[derive(Debug, Default)]
struct Reading {
    sensor: String,
    value: f64,
}

impl AutoMap for Reading {
    fn auto_map(map: &mut AutoMapper<'_, Self>) {
        map.scalar("sensor", |r| &mut r.sensor);
        map.scalar("value", |r| &mut r.value);
    }
}

#[derive(Debug, Default)]
struct Loop {
    inner: Option<Box<Loop>>,
}

impl AutoMap for Loop {
    fn auto_map(map: &mut AutoMapper<'_, Self>) {
        map.nested("inner", |l| &mut **l.inner.get_or_insert_with(Default::default));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn observer_sees_each_row_outcome_in_order() {
    init_tracing();
    let obs = Arc::new(RecordingObserver::default());
    let mapper = RowMapper::new().with_observer(obs.clone());

    let sheet = Sheet::from_strings(
        Some(&["sensor", "value"]),
        &[&["t1", "1.5"], &["t2", "oops"], &["t3", ""]],
    );
    let results: Vec<_> = mapper.map_sheet::<Reading>(&sheet).unwrap().collect();
    assert_eq!(results.len(), 3);

    assert_eq!(*obs.mapped.lock().unwrap(), vec![2]);
    assert_eq!(
        *obs.failures.lock().unwrap(),
        vec![(3, MappingSeverity::Warning), (4, MappingSeverity::Warning)]
    );
    // Bad cells are below the default Critical threshold.
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn schema_errors_alert_at_a_lower_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let mapper = RowMapper::new()
        .with_observer(obs.clone())
        .alert_at_or_above(MappingSeverity::Error);

    let sheet = Sheet::from_strings(Some(&["sensor"]), &[&["t1"]]);
    let _ = mapper.map_row::<Reading>(&sheet.row(0).unwrap()).unwrap_err();

    assert_eq!(
        *obs.failures.lock().unwrap(),
        vec![(2, MappingSeverity::Error)]
    );
    assert_eq!(*obs.alerts.lock().unwrap(), vec![MappingSeverity::Error]);
}

#[test]
fn unmappable_type_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![obs.clone(), Arc::new(TracingObserver)]);
    let mapper = RowMapper::new().with_observer(Arc::new(composite));

    let sheet = Sheet::from_strings(None, &[&["x"]]);
    let err = mapper.map_row::<Loop>(&sheet.row(0).unwrap()).unwrap_err();
    assert!(matches!(err, MappingError::RecursiveMapping { .. }));
    assert_eq!(
        *obs.failures.lock().unwrap(),
        vec![(1, MappingSeverity::Critical)]
    );
    assert_eq!(*obs.alerts.lock().unwrap(), vec![MappingSeverity::Critical]);
}
