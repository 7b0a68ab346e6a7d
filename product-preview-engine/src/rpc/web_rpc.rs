use crate::engine::core::commands::{ViewerCommand, ViewerCommandQueue};
use crate::engine::weather::state::{SkyboxSet, WeatherState};
use crate::tools::dimensions::{LengthUnit, ProductDimensions};
use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Responses waiting to be posted back to the host page.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the host command channel for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .init_resource::<ViewerCommandQueue>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    match window() {
        Some(window) => {
            if let Err(e) = window
                .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            {
                error!("Failed to register message listener: {:?}", e);
            }
        }
        None => error!("Window object not available; host commands disabled"),
    }

    // Ownership moves to JS so the listener outlives this system.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Raw messages collected by the JS listener.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut queue: ResMut<ViewerCommandQueue>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                if let Some(response) = handle_rpc_request(&request, &mut queue) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => warn!("Ignoring malformed RPC message: {}", parse_error),
        }
    }
}

/// Queue the request's command. Only requests with an ID get a response.
fn handle_rpc_request(request: &RpcRequest, queue: &mut ViewerCommandQueue) -> Option<RpcResponse> {
    let result = parse_rpc_command(&request.method, &request.params).map(|command| {
        debug!("RPC {} → {:?}", request.method, command);
        queue.push(command);
        serde_json::json!({ "success": true })
    });

    if let Err(error) = &result {
        warn!("RPC {} rejected: {}", request.method, error.message);
    }

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn params<T: DeserializeOwned>(value: &serde_json::Value, expected: &str) -> Result<T, RpcError> {
    serde_json::from_value::<T>(value.clone())
        .map_err(|_| RpcError::invalid_params(&format!("Expected {}", expected)))
}

fn parse_unit(unit: &str) -> Result<LengthUnit, RpcError> {
    unit.parse()
        .map_err(|_| RpcError::invalid_params(&format!("Unknown unit: {}", unit)))
}

fn parse_weather(name: &str) -> Result<WeatherState, RpcError> {
    WeatherState::from_string(name)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown weather: {}", name)))
}

/// Translate a host method call into a viewer command.
pub fn parse_rpc_command(
    method: &str,
    value: &serde_json::Value,
) -> Result<ViewerCommand, RpcError> {
    #[derive(Deserialize)]
    struct SetModelsParams {
        urls: Vec<String>,
        #[serde(default)]
        index: usize,
    }
    #[derive(Deserialize)]
    struct IndexParams {
        index: usize,
    }
    #[derive(Deserialize)]
    struct WeatherParams {
        weather: String,
    }
    #[derive(Deserialize)]
    struct SkyboxParams {
        skyboxes: HashMap<String, Option<String>>,
    }
    #[derive(Deserialize)]
    struct DimensionParams {
        dimensions: Option<ProductDimensions>,
    }
    #[derive(Deserialize)]
    struct UnitParams {
        unit: String,
    }
    #[derive(Deserialize)]
    struct VisibleParams {
        visible: bool,
    }
    #[derive(Deserialize)]
    struct ResizeParams {
        width: f32,
        height: f32,
    }

    match method {
        "set_models" => {
            let p: SetModelsParams = params(value, "'urls' array and optional 'index'")?;
            Ok(ViewerCommand::SetModels {
                urls: p.urls,
                start_index: p.index,
            })
        }
        "show_model" => {
            let p: IndexParams = params(value, "'index' parameter")?;
            Ok(ViewerCommand::ShowModel(p.index))
        }
        "set_weather" => {
            let p: WeatherParams = params(value, "'weather' parameter")?;
            Ok(ViewerCommand::SetWeather(parse_weather(&p.weather)?))
        }
        "set_skyboxes" => {
            let p: SkyboxParams = params(value, "'skyboxes' map of weather to URL")?;
            let mut skyboxes = SkyboxSet::default();
            for (name, url) in p.skyboxes {
                if let Some(url) = url {
                    skyboxes.insert(parse_weather(&name)?, url);
                }
            }
            Ok(ViewerCommand::SetSkyboxes(skyboxes))
        }
        "set_dimensions" => {
            let p: DimensionParams =
                params(value, "'dimensions' with width, height, thickness, units or null")?;
            Ok(ViewerCommand::SetDimensions(p.dimensions))
        }
        "set_display_unit" => {
            let p: UnitParams = params(value, "'unit' parameter")?;
            Ok(ViewerCommand::SetDisplayUnit(parse_unit(&p.unit)?))
        }
        "set_measurements_visible" => {
            let p: VisibleParams = params(value, "'visible' parameter")?;
            Ok(ViewerCommand::SetMeasurementsVisible(p.visible))
        }
        "set_assumed_unit" => {
            let p: UnitParams = params(value, "'unit' parameter")?;
            Ok(ViewerCommand::SetAssumedUnit(parse_unit(&p.unit)?))
        }
        "resize" => {
            let p: ResizeParams = params(value, "'width' and 'height' parameters")?;
            if !(p.width.is_finite() && p.height.is_finite() && p.width > 0.0 && p.height > 0.0) {
                return Err(RpcError::invalid_params("Size must be positive"));
            }
            Ok(ViewerCommand::Resize {
                width: p.width,
                height: p.height,
            })
        }
        "teardown" => Ok(ViewerCommand::Teardown),
        _ => Err(RpcError::method_not_found(method)),
    }
}

fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(serde_json::json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}
