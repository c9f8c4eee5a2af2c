use crate::error::Result;

/// Fit/transform contract shared by the feature stages.
///
/// `fit` learns a frozen state from training text; `transform` applies that
/// state to any text without modifying it. The state is returned by value so
/// one stage can be fit independently per cross-validation fold.
pub trait Transformer: Send + Sync {
    /// Learned, serializable state
    type State: Clone + Send + Sync;

    /// Transformed representation of a batch of messages
    type Output;

    /// Learn state from training messages
    fn fit(&self, messages: &[String]) -> Result<Self::State>;

    /// Transform messages with previously learned state
    fn transform(&self, messages: &[String], state: &Self::State) -> Result<Self::Output>;

    /// Fit and transform in one step
    fn fit_transform(&self, messages: &[String]) -> Result<(Self::State, Self::Output)> {
        let state = self.fit(messages)?;
        let output = self.transform(messages, &state)?;
        Ok((state, output))
    }
}
