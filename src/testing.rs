// In-memory doubles for the backend and the logger, shared by tests and benches.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    logger::Logger,
    query::{ApiError, QueryApi, QueryOptions, QueryResponse},
    window::Window,
};

// Answers from canned responses keyed by query string and records every call.
#[derive(Debug, Default)]
pub struct FakeQueryApi {
    responses: HashMap<String, Result<QueryResponse, ApiError>>,
    calls: RefCell<Vec<(String, Window)>>,
}

impl FakeQueryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: &str, response: QueryResponse) -> Self {
        self.responses.insert(query.to_string(), Ok(response));
        self
    }

    pub fn fail(mut self, query: &str, error: ApiError) -> Self {
        self.responses.insert(query.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<(String, Window)> {
        self.calls.borrow().clone()
    }
}

impl QueryApi for FakeQueryApi {
    fn query(
        &self,
        query: &str,
        window: Window,
        _options: &QueryOptions,
    ) -> Result<QueryResponse, ApiError> {
        self.calls.borrow_mut().push((query.to_string(), window));
        match self.responses.get(query) {
            Some(response) => response.clone(),
            None => Err(ApiError::new(400, "Bad Request")),
        }
    }
}

// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    messages: Rc<RefCell<Vec<String>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Logger for MemoryLogger {
    fn warning(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
pub mod tests {
    use crate::{
        logger::Logger,
        query::{ApiError, QueryApi, QueryOptions},
        window::Window,
    };

    use super::{FakeQueryApi, MemoryLogger};

    #[test]
    fn test_memory_logger_shares_buffer() {
        let logger = MemoryLogger::new();
        let clone = logger.clone();
        logger.warning("first");
        clone.warning("second");
        assert_eq!(logger.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_fake_api_rejects_unknown_queries() {
        let api = FakeQueryApi::new().fail("ts(a)", ApiError::new(503, "Service Unavailable"));
        let window = Window::new(0, 3600);
        assert_eq!(
            api.query("ts(a)", window, &QueryOptions::default()),
            Err(ApiError::new(503, "Service Unavailable"))
        );
        assert_eq!(
            api.query("ts(b)", window, &QueryOptions::default()),
            Err(ApiError::new(400, "Bad Request"))
        );
        assert_eq!(api.calls().len(), 2);
    }
}
