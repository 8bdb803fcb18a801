use crate::error::{DispatchError, RegisterError};
use framerpc::{Context, SerializeType};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Error type returned by service methods. Its display text is sent back to
/// the caller.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased method: decodes the arguments with the request's serialization,
/// invokes the typed method and encodes its reply the same way.
pub(crate) type MethodHandler = Arc<
    dyn Fn(Context, SerializeType, Vec<u8>) -> BoxFuture<'static, Result<Vec<u8>, DispatchError>>
        + Send
        + Sync,
>;

/// A named set of methods ready to be registered with an `RpcServer`.
pub struct Service {
    name: String,
    metadata: String,
    methods: HashMap<String, MethodHandler>,
}

impl Service {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form text supplied at registration.
    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub(crate) fn set_metadata(&mut self, metadata: String) {
        self.metadata = metadata;
    }

    pub(crate) fn has_methods(&self) -> bool {
        !self.methods.is_empty()
    }

    pub(crate) fn handler(&self, method_name: &str) -> Option<MethodHandler> {
        self.methods.get(method_name).cloned()
    }
}

/// Builds a `Service` around a shared receiver value.
///
/// ```ignore
/// let service = ServiceBuilder::new(Arith)
///     .method("Add", |_: &Arith, _, args: Args, reply: &mut Reply| {
///         reply.c = args.a + args.b;
///         Ok(())
///     })?
///     .build();
/// ```
pub struct ServiceBuilder<T> {
    name: String,
    receiver: Arc<T>,
    methods: HashMap<String, MethodHandler>,
}

impl<T> ServiceBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Names the service after the receiver's type, e.g. `Arith` for
    /// `my_crate::Arith`.
    pub fn new(receiver: T) -> Self {
        let type_name = std::any::type_name::<T>();
        // Generic parameters may themselves contain `::`.
        let base = type_name.split('<').next().unwrap_or(type_name);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::named(name, receiver)
    }

    pub fn named(name: impl Into<String>, receiver: T) -> Self {
        Self {
            name: name.into(),
            receiver: Arc::new(receiver),
            methods: HashMap::new(),
        }
    }

    /// Adds a synchronous method.
    ///
    /// The method fills in a default-constructed reply. It runs on Tokio's
    /// blocking pool, so it may block without stalling the connection.
    ///
    /// # Arguments
    ///
    /// * `name` - The method name callers use after the `.` separator.
    /// * `method` - Receives the service value, the call context, the decoded
    ///   arguments and the reply to fill in.
    ///
    /// # Returns
    ///
    /// The builder, or `RegisterError::DuplicateMethod` if `name` is taken.
    pub fn method<A, R, F>(self, name: &str, method: F) -> Result<Self, RegisterError>
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&T, &Context, A, &mut R) -> Result<(), ServiceError> + Send + Sync + 'static,
    {
        let receiver = self.receiver.clone();
        let method = Arc::new(method);
        let service_method = format!("{}.{}", self.name, name);

        let handler: MethodHandler = Arc::new(
            move |ctx: Context, serialize_type: SerializeType, data: Vec<u8>| {
                invoke_blocking(
                    receiver.clone(),
                    method.clone(),
                    service_method.clone(),
                    ctx,
                    serialize_type,
                    data,
                )
                .boxed()
            },
        );

        self.insert(name, handler)
    }

    /// Adds an asynchronous method that returns its reply.
    ///
    /// A panic inside the method is caught and answered with an error
    /// response instead of tearing down the request task.
    pub fn async_method<A, R, F, Fut>(self, name: &str, method: F) -> Result<Self, RegisterError>
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<T>, Context, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
    {
        let receiver = self.receiver.clone();
        let method = Arc::new(method);
        let service_method = format!("{}.{}", self.name, name);

        let handler: MethodHandler = Arc::new(
            move |ctx: Context, serialize_type: SerializeType, data: Vec<u8>| {
                invoke_async(
                    receiver.clone(),
                    method.clone(),
                    service_method.clone(),
                    ctx,
                    serialize_type,
                    data,
                )
                .boxed()
            },
        );

        self.insert(name, handler)
    }

    pub fn build(self) -> Service {
        Service {
            name: self.name,
            metadata: String::new(),
            methods: self.methods,
        }
    }

    fn insert(mut self, name: &str, handler: MethodHandler) -> Result<Self, RegisterError> {
        if self.methods.contains_key(name) {
            return Err(RegisterError::DuplicateMethod {
                service: self.name,
                method: name.to_string(),
            });
        }
        self.methods.insert(name.to_string(), handler);
        Ok(self)
    }
}

async fn invoke_blocking<T, A, R, F>(
    receiver: Arc<T>,
    method: Arc<F>,
    service_method: String,
    ctx: Context,
    serialize_type: SerializeType,
    data: Vec<u8>,
) -> Result<Vec<u8>, DispatchError>
where
    T: Send + Sync + 'static,
    A: DeserializeOwned + Send + 'static,
    R: Serialize + Default + Send + 'static,
    F: Fn(&T, &Context, A, &mut R) -> Result<(), ServiceError> + Send + Sync + 'static,
{
    let args: A = serialize_type
        .decode(&data)
        .map_err(DispatchError::DecodeArgs)?;

    let outcome = tokio::task::spawn_blocking(move || {
        let mut reply = R::default();
        method(&*receiver, &ctx, args, &mut reply).map(|()| reply)
    })
    .await
    .map_err(|_| DispatchError::Panicked(service_method))?;

    let reply = outcome.map_err(|e| DispatchError::Method(e.to_string()))?;

    serialize_type
        .encode(&reply)
        .map_err(DispatchError::EncodeReply)
}

async fn invoke_async<T, A, R, F, Fut>(
    receiver: Arc<T>,
    method: Arc<F>,
    service_method: String,
    ctx: Context,
    serialize_type: SerializeType,
    data: Vec<u8>,
) -> Result<Vec<u8>, DispatchError>
where
    A: DeserializeOwned,
    R: Serialize,
    F: Fn(Arc<T>, Context, A) -> Fut,
    Fut: Future<Output = Result<R, ServiceError>>,
{
    let args: A = serialize_type
        .decode(&data)
        .map_err(DispatchError::DecodeArgs)?;

    let reply = AssertUnwindSafe(async move { method(receiver, ctx, args).await })
        .catch_unwind()
        .await
        .map_err(|_| DispatchError::Panicked(service_method))?
        .map_err(|e| DispatchError::Method(e.to_string()))?;

    serialize_type
        .encode(&reply)
        .map_err(DispatchError::EncodeReply)
}
