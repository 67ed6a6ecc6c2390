use crate::payload::{decode, FailPayload};
use entitykit_compose::{
    derive_keys_with_verb, selector, ActionSet, AsyncKeys, ComposeResult, CompositionContext,
    FeatureState, FeatureTrait, Reducer, ReducerFragment, SelectorSet,
};
use entitykit_types::CallStatus;

/// Status bookkeeping for one named async call.
///
/// `CallStatusTrait::new("checkout")` contributes the actions `checkout`,
/// `checkoutSuccess` and `checkoutFail`, the state field `checkoutStatus`,
/// and the selectors `isCheckoutLoading`, `isCheckoutLoaded`,
/// `isCheckoutFail` and `selectCheckoutError`. Running the call is up to
/// the host.
#[derive(Debug, Clone)]
pub struct CallStatusTrait {
    key: String,
    keys: AsyncKeys,
}

impl CallStatusTrait {
    pub fn new(name: &str) -> Self {
        let keys = derive_keys_with_verb("", name);
        Self {
            key: format!("{}CallStatus", keys.call),
            keys,
        }
    }

    pub fn keys(&self) -> &AsyncKeys {
        &self.keys
    }
}

impl FeatureTrait for CallStatusTrait {
    fn key(&self) -> &str {
        &self.key
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(self.keys.call.clone())
            .action(self.keys.success.clone())
            .action(self.keys.fail.clone()))
    }

    fn selectors(&self, _ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let field = self.keys.status.clone();
        let status = move |s: &FeatureState| s.get_or_default::<CallStatus>(&field);
        let (loading, loaded, failed, error) =
            (status.clone(), status.clone(), status.clone(), status);
        Ok(SelectorSet::new()
            .with(
                self.keys.loading.clone(),
                selector(move |s: &FeatureState| loading(s).is_loading()),
            )
            .with(
                self.keys.loaded.clone(),
                selector(move |s: &FeatureState| loaded(s).is_loaded()),
            )
            .with(
                self.keys.failed.clone(),
                selector(move |s: &FeatureState| failed(s).is_fail()),
            )
            .with(
                self.keys.error.clone(),
                selector(move |s: &FeatureState| error(s).error().cloned()),
            ))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(self.keys.status.clone(), CallStatus::Idle))
    }

    fn reducer(&self, _ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let (a, b, c) = (
            self.keys.status.clone(),
            self.keys.status.clone(),
            self.keys.status.clone(),
        );
        Ok(Some(
            ReducerFragment::new()
                .on(self.keys.call.clone(), move |s, _| s.with(a.clone(), CallStatus::Loading))
                .on(self.keys.success.clone(), move |s, _| {
                    s.with(b.clone(), CallStatus::Success)
                })
                .on(self.keys.fail.clone(), move |s, action| {
                    let error = decode::<FailPayload>(action).and_then(|p| p.error);
                    s.with(c.clone(), CallStatus::Fail { error })
                })
                .into_reducer(),
        ))
    }
}
