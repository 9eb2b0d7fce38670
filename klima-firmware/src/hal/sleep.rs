// Wake-Grund und Deep-Sleep
use core::time::Duration as CoreDuration;

use defmt::info;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, InputPin, Pull, RtcPinWithResistors};
use esp_hal::peripherals::LPWR;
use esp_hal::rtc_cntl::sleep::{Ext1WakeupSource, TimerWakeupSource, WakeupLevel};
use esp_hal::rtc_cntl::{Rtc, SocResetReason, reset_reason, wakeup_cause};
use esp_hal::system::{Cpu, SleepSource};
use klima_core::{SleepRequest, WakeCause, WakeSource};

/// Leitet den WakeCause aus Reset-Grund und Wake-Quelle ab
pub fn wake_cause() -> WakeCause {
    let deep_sleep_reset = reset_reason(Cpu::ProCpu) == Some(SocResetReason::CoreDeepSleep);
    let source = match wakeup_cause() {
        SleepSource::Timer => WakeSource::Timer,
        SleepSource::Ext1 => WakeSource::OperatorPin,
        _ => WakeSource::Other,
    };
    WakeCause::classify(deep_sleep_reset, source)
}

/// Bedien-Taster gedrückt? (aktiv low)
pub fn operator_asserted<'d>(pin: impl InputPin + 'd) -> bool {
    let input = Input::new(pin, InputConfig::default().with_pull(Pull::Up));
    input.is_low()
}

/// Deep-Sleep mit Timer und Bedien-Taster als Wake-Quellen
///
/// Kehrt nie zurück, das Gerät bootet beim Aufwachen neu.
pub fn deep_sleep<P: RtcPinWithResistors>(
    lpwr: LPWR<'static>,
    mut operator_pin: P,
    request: &SleepRequest,
) -> ! {
    let mut rtc = Rtc::new(lpwr);
    let timer = TimerWakeupSource::new(CoreDuration::from_secs(u64::from(request.duration_secs)));

    // Pull-Up auch im Sleep, sonst floatet der Pin und weckt sofort
    operator_pin.rtcio_pullup(true);
    operator_pin.rtcio_pulldown(false);
    let mut pins: [(&mut dyn RtcPinWithResistors, WakeupLevel); 1] =
        [(&mut operator_pin, WakeupLevel::Low)];
    let ext1 = Ext1WakeupSource::new(&mut pins);

    info!(
        "Lifecycle: entering deep sleep for {}s with {}",
        request.duration_secs, request.reading
    );

    // Log-Ausgabe noch rausschieben
    Delay::new().delay_millis(100);

    rtc.sleep_deep(&[&timer, &ext1])
}
