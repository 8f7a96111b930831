use std::{iter::FusedIterator, vec};

use chrono::Utc;
use thiserror::Error;

use crate::{
    config::{Config, ConfigError},
    logger::Logger,
    metric::{MetricRow, Row},
    properties::{Properties, START_TIME_KEY},
    query::{http::HttpQueryApi, ApiError, QueryApi, QueryOptions, QueryResponse},
    window::{format_time, parse_time, truncate_to_hour, TimeError, Window},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid start-time cursor")]
    InvalidCursor(#[source] TimeError),
    #[error("invalid backend configuration")]
    Config(#[from] ConfigError),
    #[error("{label}: query failed: {source}")]
    Api { label: String, source: ApiError },
    #[error("{label}: metrics not found. {detail}")]
    NoTimeseries { label: String, detail: String },
    #[error("{label}: customer and cluster tags missing")]
    MissingTags { label: String },
    #[error("{label}: data point timestamp out of range")]
    Timestamp { label: String, source: TimeError },
}

// Builds the api for a run once a query is known to be due.
pub trait Connect {
    type Api: QueryApi;

    fn connect(&self, properties: &Properties) -> Result<Self::Api, Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnect;

impl Connect for HttpConnect {
    type Api = HttpQueryApi;

    // Only configuration faults fail here. Transport failures, including a
    // client that cannot be built, surface per query.
    fn connect(&self, properties: &Properties) -> Result<HttpQueryApi, Error> {
        Ok(HttpQueryApi::new(Config::from_properties(properties)?))
    }
}

// An already-built api ignores the connection properties.
impl<'a, A: QueryApi> Connect for &'a A {
    type Api = &'a A;

    fn connect(&self, _properties: &Properties) -> Result<&'a A, Error> {
        Ok(*self)
    }
}

fn system_clock() -> i64 {
    Utc::now().timestamp()
}

// Queries the hours elapsed since the `start-time` cursor, then moves the
// cursor to the top of the current hour.
pub struct Runner<C, L> {
    connect: C,
    log: L,
    clock: Box<dyn Fn() -> i64>,
}

impl<C: Connect, L: Logger> Runner<C, L> {
    pub fn new(connect: C, log: L) -> Self {
        Self {
            connect,
            log,
            clock: Box::new(system_clock),
        }
    }

    // Seconds since epoch.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn end_time(&self) -> i64 {
        truncate_to_hour((self.clock)())
    }

    /// Runs a single query over `[start-time, end_time)` and returns one row
    /// per data point.
    ///
    /// Without a `start-time`, or once it has caught up with the current
    /// hour, nothing is queried. Either way `start-time` is then set to the
    /// current hour.
    ///
    /// NOTE: a failed query still advances `start-time`, so the failed window
    /// is skipped rather than retried on the next run. A malformed cursor or
    /// missing connection properties leave `start-time` untouched.
    pub fn run(&self, properties: &mut Properties, query: &str) -> Result<Vec<Row>, Error> {
        let end_time = self.end_time();
        let cursor = format_time(end_time).map_err(Error::InvalidCursor)?;
        let rows = match pending_window(properties, end_time)? {
            Some(window) => {
                let api = self.connect.connect(properties)?;
                self.fetch(&api, query, query, window)
            }
            None => Ok(vec![]),
        };
        properties.set(START_TIME_KEY, cursor);
        rows
    }

    // The `(metric, query)` pairs are copied up front, in iteration order.
    pub fn run_all<'p, I, K, V>(
        self,
        properties: &'p mut Properties,
        queries: I,
    ) -> Queries<'p, C, L>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let queries: Vec<(String, String)> = queries
            .into_iter()
            .map(|(metric, query)| (metric.into(), query.into()))
            .collect();
        Queries {
            runner: self,
            properties,
            queries: queries.into_iter(),
            state: State::Pending,
        }
    }

    // Every failure is logged before it is returned.
    fn fetch<A: QueryApi>(
        &self,
        api: &A,
        label: &str,
        query: &str,
        window: Window,
    ) -> Result<Vec<Row>, Error> {
        let rows = api
            .query(query, window, &QueryOptions::default())
            .map_err(|source| Error::Api {
                label: label.to_string(),
                source,
            })
            .and_then(|response| flatten(label, &response));
        if let Err(e) = &rows {
            self.log.warning(&e.to_string());
        }
        rows
    }
}

fn pending_window(properties: &Properties, end_time: i64) -> Result<Option<Window>, Error> {
    let Some(start_time) = properties.start_time() else {
        return Ok(None);
    };
    let start_time = parse_time(start_time).map_err(Error::InvalidCursor)?;
    let window = Window::new(start_time, end_time);
    Ok((!window.is_empty()).then_some(window))
}

// Every series must carry `customer` and `cluster` tags.
pub fn flatten(label: &str, response: &QueryResponse) -> Result<Vec<Row>, Error> {
    let Some(timeseries) = &response.timeseries else {
        return Err(Error::NoTimeseries {
            label: label.to_string(),
            detail: response.detail().to_string(),
        });
    };

    let mut rows = vec![];
    for series in timeseries {
        let (Some(customer), Some(cluster)) = (series.tag("customer"), series.tag("cluster"))
        else {
            return Err(Error::MissingTags {
                label: label.to_string(),
            });
        };
        for point in &series.data {
            let ts = format_time(point.timestamp).map_err(|source| Error::Timestamp {
                label: label.to_string(),
                source,
            })?;
            rows.push(Row {
                customer: customer.to_string(),
                cluster: cluster.to_string(),
                ts,
                value: point.value,
            });
        }
    }
    Ok(rows)
}

enum State<A> {
    Pending,
    Querying {
        api: A,
        window: Window,
        cursor: String,
    },
    Done,
}

/// Lazy, single-pass sequence of per-metric row lists.
///
/// Nothing happens until the first call to `next`, which reads the clock and
/// the cursor. Every call queries the remaining metrics until one returns rows.
/// Metrics that fail, or whose response has no series or untagged series,
/// are logged and skipped. `start-time` is written only when the sequence
/// runs out; dropping it early leaves the cursor as it was. A cursor or
/// configuration error is yielded once and ends the sequence.
pub struct Queries<'p, C: Connect, L> {
    runner: Runner<C, L>,
    properties: &'p mut Properties,
    queries: vec::IntoIter<(String, String)>,
    state: State<C::Api>,
}

impl<'p, C: Connect, L: Logger> Queries<'p, C, L> {
    fn begin(&mut self) -> Result<State<C::Api>, Error> {
        let end_time = self.runner.end_time();
        let cursor = format_time(end_time).map_err(Error::InvalidCursor)?;
        match pending_window(self.properties, end_time)? {
            Some(window) => {
                let api = self.runner.connect.connect(self.properties)?;
                Ok(State::Querying {
                    api,
                    window,
                    cursor,
                })
            }
            None => {
                self.properties.set(START_TIME_KEY, cursor);
                Ok(State::Done)
            }
        }
    }
}

impl<'p, C: Connect, L: Logger> Iterator for Queries<'p, C, L> {
    type Item = Result<Vec<MetricRow>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Pending => match self.begin() {
                    Ok(state) => self.state = state,
                    Err(e) => return Some(Err(e)),
                },
                State::Querying {
                    api,
                    window,
                    cursor,
                } => {
                    let Some((metric, query)) = self.queries.next() else {
                        self.properties.set(START_TIME_KEY, cursor);
                        return None;
                    };
                    let rows = self
                        .runner
                        .fetch(&api, &metric, &query, window)
                        .unwrap_or_default();
                    self.state = State::Querying {
                        api,
                        window,
                        cursor,
                    };
                    if !rows.is_empty() {
                        return Some(Ok(rows
                            .into_iter()
                            .map(|row| row.with_metric(&metric))
                            .collect()));
                    }
                }
                State::Done => return None,
            }
        }
    }
}

impl<'p, C: Connect, L: Logger> FusedIterator for Queries<'p, C, L> {}

pub fn run_query(
    properties: &mut Properties,
    query: &str,
    log: &dyn Logger,
) -> Result<Vec<Row>, Error> {
    Runner::new(HttpConnect, log).run(properties, query)
}

pub fn run_queries<'p, 'l, I, K, V>(
    properties: &'p mut Properties,
    queries: I,
    log: &'l dyn Logger,
) -> Queries<'p, HttpConnect, &'l dyn Logger>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Runner::new(HttpConnect, log).run_all(properties, queries)
}
