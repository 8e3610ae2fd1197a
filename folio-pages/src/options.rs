// Handler selection switches

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    /// Route value (and query key) naming the handler to run
    pub handler_route_key: String,
    /// Read the handler name from the query string when the route has none
    pub allow_handler_from_query: bool,
    /// Serve HEAD requests with GET handlers when no HEAD handler exists
    pub head_falls_back_to_get: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            handler_route_key: "handler".to_string(),
            allow_handler_from_query: true,
            head_falls_back_to_get: true,
        }
    }
}
