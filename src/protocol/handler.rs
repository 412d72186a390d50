use crate::protocol::message::{EventData, Message, OperationRequest, OperationResponse};

/// Receiver of decoded application messages.
///
/// With the default [`ResponseRouting::RequestCallback`](crate::config::ResponseRouting)
/// operation responses arrive through [`on_request`](MessageHandler::on_request) as
/// [`Message::Response`], and `on_response` is never called.
pub trait MessageHandler {
    fn on_request(&mut self, message: Message);

    fn on_response(&mut self, response: OperationResponse) {
        let _ = response;
    }

    fn on_event(&mut self, event: EventData);
}

impl<H: MessageHandler + ?Sized> MessageHandler for &mut H {
    fn on_request(&mut self, message: Message) {
        (**self).on_request(message);
    }

    fn on_response(&mut self, response: OperationResponse) {
        (**self).on_response(response);
    }

    fn on_event(&mut self, event: EventData) {
        (**self).on_event(event);
    }
}

impl<H: MessageHandler + ?Sized> MessageHandler for Box<H> {
    fn on_request(&mut self, message: Message) {
        (**self).on_request(message);
    }

    fn on_response(&mut self, response: OperationResponse) {
        (**self).on_response(response);
    }

    fn on_event(&mut self, event: EventData) {
        (**self).on_event(event);
    }
}

type RequestFn = dyn FnMut(Message) + Send + 'static;
type ResponseFn = dyn FnMut(OperationResponse) + Send + 'static;
type EventFn = dyn FnMut(EventData) + Send + 'static;

/// Closure-based [`MessageHandler`]. Unregistered callbacks drop their messages.
///
/// ```rust
/// use photon_protocol::protocol::handler::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .with_request(|message| println!("request {}", message.code()))
///     .with_event(|event| println!("event {}", event.code));
/// ```
#[derive(Default)]
pub struct Callbacks {
    request: Option<Box<RequestFn>>,
    response: Option<Box<ResponseFn>>,
    event: Option<Box<EventFn>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request<F>(mut self, callback: F) -> Self
    where
        F: FnMut(Message) + Send + 'static,
    {
        self.request = Some(Box::new(callback));
        self
    }

    pub fn with_response<F>(mut self, callback: F) -> Self
    where
        F: FnMut(OperationResponse) + Send + 'static,
    {
        self.response = Some(Box::new(callback));
        self
    }

    pub fn with_event<F>(mut self, callback: F) -> Self
    where
        F: FnMut(EventData) + Send + 'static,
    {
        self.event = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .field("event", &self.event.is_some())
            .finish()
    }
}

impl MessageHandler for Callbacks {
    fn on_request(&mut self, message: Message) {
        if let Some(callback) = self.request.as_mut() {
            callback(message);
        }
    }

    fn on_response(&mut self, response: OperationResponse) {
        if let Some(callback) = self.response.as_mut() {
            callback(response);
        }
    }

    fn on_event(&mut self, event: EventData) {
        if let Some(callback) = self.event.as_mut() {
            callback(event);
        }
    }
}

/// Handler that keeps every message it receives, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collector {
    pub requests: Vec<Message>,
    pub responses: Vec<OperationResponse>,
    pub events: Vec<EventData>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total messages received across all callbacks.
    pub fn len(&self) -> usize {
        self.requests.len() + self.responses.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Requests that really were operation requests.
    pub fn operation_requests(&self) -> impl Iterator<Item = &OperationRequest> {
        self.requests.iter().filter_map(|message| match message {
            Message::Request(request) => Some(request),
            _ => None,
        })
    }
}

impl MessageHandler for Collector {
    fn on_request(&mut self, message: Message) {
        self.requests.push(message);
    }

    fn on_response(&mut self, response: OperationResponse) {
        self.responses.push(response);
    }

    fn on_event(&mut self, event: EventData) {
        self.events.push(event);
    }
}
