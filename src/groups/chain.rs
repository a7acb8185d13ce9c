/// State chain: an ordered, self-consistent list of (state, delta) links.
///
/// Every link after the first satisfies `apply(previous.state, link.delta) ==
/// link.state`. Pushes that would break this are repaired rather than
/// rejected:
///
/// - a missing delta is reconstructed with `diff`;
/// - a missing state is computed with `apply`;
/// - a delta that does not apply is dropped and the state is trusted;
/// - a delta that applies but lands somewhere other than the claimed state is
///   recorded as its own link, followed by a correcting link to the claimed
///   state.
///
/// Pushes that would not move the chain (`same_state(tail, state)`) are
/// suppressed.
///
/// The chain knows nothing about groups. Behaviour is injected with a
/// `ChainStrategy`, which must be pure: a single push may call it several
/// times, including on intermediate states that never reach the chain.

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

pub trait ChainStrategy {
    type State: Clone;
    type Delta: Clone;

    /// The state after `delta`, or `None` if it cannot be applied to `state`.
    fn apply(&self, state: &Self::State, delta: &Self::Delta) -> Option<Self::State>;

    /// A delta explaining the move from `before` to `after`.
    fn diff(&self, before: &Self::State, after: &Self::State) -> Self::Delta;

    /// Whether two states are interchangeable for the chain.
    fn same_state(&self, a: &Self::State, b: &Self::State) -> bool;
}

impl<T: ChainStrategy + ?Sized> ChainStrategy for &T {
    type State = T::State;
    type Delta = T::Delta;

    fn apply(&self, state: &Self::State, delta: &Self::Delta) -> Option<Self::State> {
        (**self).apply(state, delta)
    }

    fn diff(&self, before: &Self::State, after: &Self::State) -> Self::Delta {
        (**self).diff(before, after)
    }

    fn same_state(&self, a: &Self::State, b: &Self::State) -> bool {
        (**self).same_state(a, b)
    }
}

// ---------------------------------------------------------------------------
// ChainLink
// ---------------------------------------------------------------------------

/// One step of the chain. The first link may have no delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink<S, D> {
    pub state: S,
    pub delta: Option<D>,
}

// ---------------------------------------------------------------------------
// StateChain
// ---------------------------------------------------------------------------

enum Step<S, D> {
    Append(S, Option<D>),
    Ignore,
    TrustState(S),
    Repair(S, D),
}

pub struct StateChain<St: ChainStrategy> {
    strategy: St,
    links: Vec<ChainLink<St::State, St::Delta>>,
}

impl<St: ChainStrategy> StateChain<St> {
    pub fn new(strategy: St) -> Self {
        StateChain {
            strategy,
            links: Vec::new(),
        }
    }

    /// Push a state, a delta, or both.
    ///
    /// See the module docs for how inconsistent pushes are repaired.
    pub fn push(&mut self, state: Option<St::State>, delta: Option<St::Delta>) {
        match self.plan(state, delta) {
            Step::Append(state, delta) => self.links.push(ChainLink { state, delta }),
            Step::Ignore => {}
            Step::TrustState(state) => {
                log::debug!("Delta does not apply to chain tail, trusting state");
                self.push(Some(state), None);
            }
            Step::Repair(state, delta) => {
                log::debug!("Delta does not produce claimed state, inserting correction");
                self.push(None, Some(delta));
                self.push(Some(state), None);
            }
        }
    }

    fn plan(&self, state: Option<St::State>, delta: Option<St::Delta>) -> Step<St::State, St::Delta> {
        let Some(latest) = self.latest_state() else {
            return match state {
                Some(state) => Step::Append(state, delta),
                None => Step::Ignore,
            };
        };

        let (state, delta) = match (state, delta) {
            (None, None) => return Step::Ignore,
            (Some(state), None) => {
                let delta = self.strategy.diff(latest, &state);
                (state, delta)
            }
            (None, Some(delta)) => match self.strategy.apply(latest, &delta) {
                Some(state) => (state, delta),
                None => {
                    log::debug!("Ignoring delta that does not apply to chain tail");
                    return Step::Ignore;
                }
            },
            (Some(state), Some(delta)) => match self.strategy.apply(latest, &delta) {
                None => return Step::TrustState(state),
                Some(calculated) if !self.strategy.same_state(&state, &calculated) => {
                    return Step::Repair(state, delta);
                }
                Some(_) => (state, delta),
            },
        };

        if self.strategy.same_state(latest, &state) {
            Step::Ignore
        } else {
            Step::Append(state, Some(delta))
        }
    }

    pub fn latest_state(&self) -> Option<&St::State> {
        self.links.last().map(|link| &link.state)
    }

    /// Owned copy of the links, oldest first.
    pub fn to_list(&self) -> Vec<ChainLink<St::State, St::Delta>> {
        self.links.clone()
    }

    pub fn into_links(self) -> Vec<ChainLink<St::State, St::Delta>> {
        self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
