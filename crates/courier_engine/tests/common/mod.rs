use std::sync::Mutex;

use courier_engine::{EngineEvent, EventSink};

pub fn init_logging() {
    courier_logging::initialize_for_tests();
}

/// Event sink that keeps everything for later assertions.
pub struct CollectSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
