//! Server metadata referenced by log fields.
//!
//! Owned by the topology layer; log calls only borrow it.

use bson::oid::ObjectId;

/// The subset of a server description that structured log messages can
/// report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDescription {
    /// Host name as given in the connection string or discovered.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Connection id assigned by the server, if known.
    pub server_connection_id: i64,
    /// Service id behind a load balancer.
    pub service_id: Option<ObjectId>,
}

impl ServerDescription {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            server_connection_id: 0,
            service_id: None,
        }
    }

    #[must_use]
    pub const fn with_connection_id(mut self, id: i64) -> Self {
        self.server_connection_id = id;
        self
    }

    /// Sets the service id. An all-zero id means "not load balanced" and
    /// clears it.
    #[must_use]
    pub fn with_service_id(mut self, service_id: ObjectId) -> Self {
        self.service_id = (service_id.bytes() != [0; 12]).then_some(service_id);
        self
    }

    /// `host:port` form used in diagnostics.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let oid = ObjectId::from_bytes([7; 12]);
        let sd = ServerDescription::new("db1.example.com", 27017)
            .with_connection_id(42)
            .with_service_id(oid);
        assert_eq!(sd.server_connection_id, 42);
        assert_eq!(sd.service_id, Some(oid));
        assert_eq!(sd.address(), "db1.example.com:27017");
    }

    #[test]
    fn zero_service_id_means_none() {
        assert_eq!(ServerDescription::new("h", 1).service_id, None);
        let sd = ServerDescription::new("h", 1).with_service_id(ObjectId::from_bytes([0; 12]));
        assert_eq!(sd.service_id, None);
    }
}
