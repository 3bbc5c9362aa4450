/// Side effects the app must carry out against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartRun {
        tasks: Vec<String>,
        max_workers: Option<usize>,
    },
    RequestStop,
    RequestBreak,
    Cancel,
}
