mod completed;
mod event;
mod function;
mod resource;

pub use completed::{CompleteEvent, DeploymentError, Resource};
pub use event::Event;
pub use function::{
    FUNCTION_ERROR, FUNCTION_INVOKED, FUNCTION_LOG, FUNCTION_RESPONSE, FunctionError,
    FunctionEvent, FunctionInvocation, FunctionInvoked, FunctionLog, FunctionResponse,
    InvocationError,
};
pub use resource::{LOG_RESOURCE_SCHEME, LogResource, validate_tab_name};
