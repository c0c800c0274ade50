//! Platform radio trait for abstraction and testability

use core::future::Future;

/// What the readiness gate needs to know about the host radio
pub trait RadioPlatform {
    fn adapter_present(&self) -> bool;

    fn is_enabled(&self) -> bool;

    /// Ask the platform to turn the adapter on. Completes when the request
    /// has been handled; the gate re-checks `is_enabled` afterwards.
    fn request_enable(&mut self) -> impl Future<Output = ()>;

    fn multi_advertisement_supported(&self) -> bool;

    /// Whether the runtime permission to advertise and connect is held
    fn permission_granted(&self) -> bool;

    /// Ask the user for permission. Resolves to the user's answer.
    fn request_permission(&mut self) -> impl Future<Output = bool>;
}

#[cfg(test)]
pub mod mock {
    //! Mock radio for testing

    use super::*;

    /// Scriptable radio. Defaults to a fully ready platform.
    #[derive(Debug, Clone)]
    pub struct MockRadioPlatform {
        pub adapter: bool,
        pub enabled: bool,
        /// Enable requests needed before the adapter turns on, `None` for never
        pub enables_after: Option<u8>,
        pub multi_advertisement: bool,
        pub permission: bool,
        /// Answer given to a permission request
        pub grant_on_request: bool,
        pub enable_requests: u8,
        pub permission_requests: u8,
    }

    impl Default for MockRadioPlatform {
        fn default() -> Self {
            Self {
                adapter: true,
                enabled: true,
                enables_after: Some(1),
                multi_advertisement: true,
                permission: true,
                grant_on_request: true,
                enable_requests: 0,
                permission_requests: 0,
            }
        }
    }

    impl MockRadioPlatform {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl RadioPlatform for MockRadioPlatform {
        fn adapter_present(&self) -> bool {
            self.adapter
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn request_enable(&mut self) {
            self.enable_requests += 1;
            if self.enables_after.is_some_and(|n| self.enable_requests >= n) {
                self.enabled = true;
            }
        }

        fn multi_advertisement_supported(&self) -> bool {
            self.multi_advertisement
        }

        fn permission_granted(&self) -> bool {
            self.permission
        }

        async fn request_permission(&mut self) -> bool {
            self.permission_requests += 1;
            self.permission = self.grant_on_request;
            self.grant_on_request
        }
    }
}
