/// One RPC method's transport-relevant metadata, as emitted by the code
/// generator for every `rpc` declaration (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    /// `/service.Name/Method`, the path a transport dispatches on.
    pub full_name: &'static str,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub methods: &'static [&'static MethodDescriptor],
}
