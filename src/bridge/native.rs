//! The host-provided bridging primitive.

use std::sync::Arc;

use super::completion::Completion;
use super::types::ActionRequest;

/// Forwards an action request to native code.
///
/// Implementations must return without blocking and later resolve the
/// completion exactly once, from any thread.
pub trait NativeBridge: Send + Sync {
    fn invoke(&self, request: ActionRequest, completion: Completion);
}

impl<B: NativeBridge + ?Sized> NativeBridge for Arc<B> {
    fn invoke(&self, request: ActionRequest, completion: Completion) {
        (**self).invoke(request, completion)
    }
}
