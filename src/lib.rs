pub mod body;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod emit;
pub mod exception;
pub mod manifest;
pub mod middleware;
pub mod node;
pub mod param;
pub mod request;
pub mod response;
pub mod router;
pub mod tree;
pub mod util;

pub use body::ParsedBody;
pub use cache::LookupCache;
pub use config::Config;
pub use dispatcher::{Dispatcher, Endpoint, Handler, HandlerResult, IntoHandlerResult, Params};
pub use emit::{ContentRange, Emitter, StreamEmitter};
pub use exception::Exception;
pub use manifest::{HandlerRegistry, RouteManifest};
pub use middleware::{build_chain, DefaultHeaders, Middleware, RequestHandler, RequestLogger};
pub use node::RouteNode;
pub use param::{HttpMethod, HttpVersion};
pub use request::Request;
pub use response::Response;
pub use router::{RouteInfo, Router};
pub use tree::{RouteMatch, RouteTree, TreeOptions};
