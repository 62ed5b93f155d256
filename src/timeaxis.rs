use crate::error::PlotError;
use crate::table::DataTable;
use chrono::NaiveDateTime;
use serde::Deserialize;

/// Sample times `i * interval` for `i` in `0..len`, computed from the index
/// so long series do not drift.
#[derive(Clone, Debug)]
pub struct SampleClock {
    next: u64,
    len: u64,
    interval: f64,
}

impl SampleClock {
    pub fn from_ms(sampling_rate_ms: f64, len: u64) -> Self {
        SampleClock {
            next: 0,
            len,
            interval: sampling_rate_ms / 1000.,
        }
    }
}

impl Iterator for SampleClock {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.len {
            return None;
        }
        let t = self.next as f64 * self.interval;
        self.next += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.len - self.next) as usize;
        (left, Some(left))
    }
}

/// Where the time of each row comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    /// row index times the sampling interval, the first column is a sample counter
    Sampled,
    /// the first column holds elapsed seconds
    Seconds,
    /// the first column holds datetimes, converted to seconds since the first row
    Datetime,
}

impl Default for TimeSource {
    fn default() -> Self {
        TimeSource::Sampled
    }
}

/// Builds the time axis, in seconds, for every row of the table.
pub fn build_time_axis(
    table: &DataTable,
    source: TimeSource,
    sampling_rate_ms: f64,
    datetime_format: &str,
) -> Result<Vec<f64>, PlotError> {
    match source {
        TimeSource::Sampled => Ok(SampleClock::from_ms(sampling_rate_ms, table.len() as u64).collect()),
        TimeSource::Seconds => first_column(table)?
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.parse::<f64>().map_err(|e| PlotError::TimeParse {
                    row,
                    value: cell.clone(),
                    reason: e.to_string(),
                })
            })
            .collect(),
        TimeSource::Datetime => {
            let datetimes = first_column(table)?
                .iter()
                .enumerate()
                .map(|(row, cell)| {
                    NaiveDateTime::parse_from_str(cell, datetime_format).map_err(|e| {
                        PlotError::TimeParse {
                            row,
                            value: cell.clone(),
                            reason: e.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<NaiveDateTime>, PlotError>>()?;
            Ok(seconds_since_first(&datetimes))
        }
    }
}

fn first_column(table: &DataTable) -> Result<&Vec<String>, PlotError> {
    table
        .columns
        .first()
        .ok_or_else(|| PlotError::NoData("the csv has no columns".into()))
}

/// elapsed seconds of each datetime relative to the first one
pub fn seconds_since_first(datetimes: &[NaiveDateTime]) -> Vec<f64> {
    let first = match datetimes.first() {
        Some(&dt) => dt,
        None => return Vec::new(),
    };
    datetimes
        .iter()
        .map(|&dt| {
            let d = dt - first;
            match d.num_microseconds() {
                Some(us) => us as f64 / 1e6,
                None => d.num_milliseconds() as f64 / 1e3,
            }
        })
        .collect()
}

/// Half-open time interval [start, end) in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<TimeWindow, PlotError> {
        if !(start.is_finite() && end.is_finite()) || start >= end {
            return Err(PlotError::Config(format!(
                "time_window start must be lower than end, got [{}, {}]",
                start, end
            )));
        }
        Ok(TimeWindow { start, end })
    }

    /// tolerance for times computed as i * interval
    fn eps(v: f64) -> f64 {
        1e-9 * v.abs().max(1.)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start - Self::eps(self.start) && t < self.end - Self::eps(self.end)
    }
}

/// Indices of the rows inside the window, all the rows without a window.
pub fn select_window(times: &[f64], window: Option<TimeWindow>) -> Result<Vec<usize>, PlotError> {
    let rows: Vec<usize> = match window {
        None => (0..times.len()).collect(),
        Some(w) => times
            .iter()
            .enumerate()
            .filter(|(_, t)| w.contains(**t))
            .map(|(i, _)| i)
            .collect(),
    };
    match (rows.is_empty(), window) {
        (true, Some(w)) => Err(PlotError::EmptyWindow {
            start: w.start,
            end: w.end,
        }),
        (true, None) => Err(PlotError::NoData("the csv has no rows".into())),
        _ => Ok(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_counts_samples() {
        let mut clock = SampleClock::from_ms(100., 5);
        assert_eq!(clock.size_hint(), (5, Some(5)));
        clock.next();
        let rest: Vec<f64> = clock.collect();
        assert_eq!(rest.len(), 4);
        assert!((rest[2] - 0.3).abs() < 1e-12);
        assert_eq!(SampleClock::from_ms(100., 0).next(), None);
    }

    #[test]
    fn window_is_half_open() {
        let times: Vec<f64> = SampleClock::from_ms(100., 100).collect();
        let rows = select_window(&times, Some(TimeWindow::new(0.3, 0.7).unwrap())).unwrap();
        assert_eq!(rows, vec![3, 4, 5, 6]);
        for &r in rows.iter() {
            assert!(times[r] >= 0.3 - 1e-9 && times[r] < 0.7);
        }
        assert_eq!(select_window(&times, None).unwrap().len(), 100);
    }

    #[test]
    fn window_outside_data() {
        let times: Vec<f64> = SampleClock::from_ms(100., 10).collect();
        match select_window(&times, Some(TimeWindow::new(5., 6.).unwrap())) {
            Err(PlotError::EmptyWindow { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(TimeWindow::new(2., 1.).is_err());
    }

    #[test]
    fn datetime_axis() {
        let table = DataTable {
            headers: vec!["datetime".into(), "load".into()],
            columns: vec![
                vec![
                    "2021-03-01 10:00:00".into(),
                    "2021-03-01 10:02:00".into(),
                    "2021-03-01 11:00:00".into(),
                ],
                vec!["1".into(), "2".into(), "3".into()],
            ],
        };
        let t = build_time_axis(&table, TimeSource::Datetime, 100., crate::DT_FORMAT).unwrap();
        assert_eq!(t, vec![0., 120., 3600.]);
        assert!(build_time_axis(&table, TimeSource::Seconds, 100., crate::DT_FORMAT).is_err());
        let t = build_time_axis(&table, TimeSource::Sampled, 250., crate::DT_FORMAT).unwrap();
        assert_eq!(t, vec![0., 0.25, 0.5]);
    }
}
