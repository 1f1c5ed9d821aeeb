use crate::datapoint::Datapoint;

/// A client that delivers datapoints to Sematext.
///
/// The client owns transport, authentication, and buffering. The reporter hands over one batch per reporting cycle
/// and does not observe whether delivery succeeded.
///
/// Any `Fn(Vec<Datapoint>)` closure can be used as a client.
pub trait SematextClient: Send + Sync {
    /// Sends a batch of datapoints.
    fn send(&self, datapoints: Vec<Datapoint>);
}

impl<F> SematextClient for F
where
    F: Fn(Vec<Datapoint>) + Send + Sync,
{
    fn send(&self, datapoints: Vec<Datapoint>) {
        self(datapoints);
    }
}
