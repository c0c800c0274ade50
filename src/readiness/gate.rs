//! Readiness check
//!
//! Stages run in a fixed order and the first failure ends the chain. A
//! disabled adapter gets a bounded number of enable requests rather than an
//! open-ended retry loop.

use crate::config::readiness::MAX_ENABLE_ATTEMPTS;
use crate::hooks::PeripheralHooks;
use crate::readiness::traits::RadioPlatform;
use crate::readiness::types::{RadioReady, RadioUnavailable, ReadinessStage};

pub struct ReadinessGate;

impl ReadinessGate {
    /// Walk the readiness stages, reporting each one through `hooks`
    pub async fn check<P: RadioPlatform, H: PeripheralHooks>(
        platform: &mut P,
        hooks: &H,
    ) -> Result<RadioReady, RadioUnavailable> {
        if !platform.adapter_present() {
            return Err(Self::fail(hooks, RadioUnavailable::AdapterMissing));
        }
        Self::pass(hooks, ReadinessStage::Adapter);

        let mut attempts = 0;
        while !platform.is_enabled() {
            if attempts == MAX_ENABLE_ATTEMPTS {
                return Err(Self::fail(hooks, RadioUnavailable::AdapterDisabled));
            }
            attempts += 1;
            log::info!(
                "RADIO: Adapter disabled, enable request {}/{}",
                attempts,
                MAX_ENABLE_ATTEMPTS
            );
            platform.request_enable().await;
        }
        Self::pass(hooks, ReadinessStage::Enabled);

        if !platform.multi_advertisement_supported() {
            return Err(Self::fail(hooks, RadioUnavailable::AdvertisingUnsupported));
        }
        Self::pass(hooks, ReadinessStage::Advertising);

        if !platform.permission_granted() {
            log::info!("RADIO: Requesting permission");
            if !platform.request_permission().await {
                return Err(Self::fail(hooks, RadioUnavailable::PermissionDenied));
            }
        }
        Self::pass(hooks, ReadinessStage::Permission);

        log::info!("RADIO: Ready");
        Ok(RadioReady::granted())
    }

    fn pass<H: PeripheralHooks>(hooks: &H, stage: ReadinessStage) {
        log::debug!("RADIO: {} ok", stage);
        hooks.on_readiness_changed(stage, true);
    }

    fn fail<H: PeripheralHooks>(hooks: &H, error: RadioUnavailable) -> RadioUnavailable {
        log::warn!("RADIO: {}", error.reason());
        hooks.on_readiness_changed(error.stage(), false);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::mock::{HookEvent, RecordingHooks};
    use crate::readiness::traits::mock::MockRadioPlatform;
    use futures::executor::block_on;

    fn check(platform: &mut MockRadioPlatform, hooks: &RecordingHooks) -> Result<(), RadioUnavailable> {
        block_on(ReadinessGate::check(platform, hooks)).map(|_| ())
    }

    #[test]
    fn test_all_stages_pass() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform::new();

        assert_eq!(check(&mut platform, &hooks), Ok(()));
        assert_eq!(
            hooks.events(),
            [
                HookEvent::Readiness(ReadinessStage::Adapter, true),
                HookEvent::Readiness(ReadinessStage::Enabled, true),
                HookEvent::Readiness(ReadinessStage::Advertising, true),
                HookEvent::Readiness(ReadinessStage::Permission, true),
            ]
        );
        assert_eq!(platform.enable_requests, 0);
        assert_eq!(platform.permission_requests, 0);
    }

    #[test]
    fn test_adapter_missing() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform {
            adapter: false,
            ..MockRadioPlatform::new()
        };

        assert_eq!(check(&mut platform, &hooks), Err(RadioUnavailable::AdapterMissing));
        assert_eq!(hooks.events(), [HookEvent::Readiness(ReadinessStage::Adapter, false)]);
    }

    #[test]
    fn test_adapter_enabled_on_request() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform {
            enabled: false,
            enables_after: Some(2),
            ..MockRadioPlatform::new()
        };

        assert_eq!(check(&mut platform, &hooks), Ok(()));
        assert_eq!(platform.enable_requests, 2);
    }

    #[test]
    fn test_enable_attempts_bounded() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform {
            enabled: false,
            enables_after: None,
            ..MockRadioPlatform::new()
        };

        assert_eq!(check(&mut platform, &hooks), Err(RadioUnavailable::AdapterDisabled));
        assert_eq!(platform.enable_requests, MAX_ENABLE_ATTEMPTS);
        assert_eq!(
            hooks.events(),
            [
                HookEvent::Readiness(ReadinessStage::Adapter, true),
                HookEvent::Readiness(ReadinessStage::Enabled, false),
            ]
        );
    }

    #[test]
    fn test_advertising_unsupported() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform {
            multi_advertisement: false,
            ..MockRadioPlatform::new()
        };

        assert_eq!(
            check(&mut platform, &hooks),
            Err(RadioUnavailable::AdvertisingUnsupported)
        );
        // Permission is never asked for
        assert_eq!(platform.permission_requests, 0);
    }

    #[test]
    fn test_permission_granted_on_request() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform {
            permission: false,
            ..MockRadioPlatform::new()
        };

        assert_eq!(check(&mut platform, &hooks), Ok(()));
        assert_eq!(platform.permission_requests, 1);
    }

    #[test]
    fn test_permission_denied() {
        let hooks = RecordingHooks::new();
        let mut platform = MockRadioPlatform {
            permission: false,
            grant_on_request: false,
            ..MockRadioPlatform::new()
        };

        assert_eq!(check(&mut platform, &hooks), Err(RadioUnavailable::PermissionDenied));
        assert_eq!(platform.permission_requests, 1);
        assert_eq!(
            hooks.events().last(),
            Some(&HookEvent::Readiness(ReadinessStage::Permission, false))
        );
    }
}
