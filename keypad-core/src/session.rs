//! The keypad session: owns all mutable state and runs one poll cycle at a time.

use embedded_hal_async::delay::DelayNs;
use embedded_storage::Storage;
use keypad_proto::{Action, Input, Response, BUTTON_COUNT, SLOT_COUNT};

use crate::action::{ActionRunner, Phase};
use crate::hid::HidSink;
use crate::input::{Edge, InputSnapshot, InputTracker, Rotation};
use crate::led::{render_selection, render_slot, LedOutput, LedPresenter};
use crate::protocol::ProtocolHandler;
use crate::store::ConfigStore;

/// What the inputs currently do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Inputs run the active slot's actions.
    Normal,
    /// The encoder picks a slot; a long press commits it.
    SlotSwitch { selection: u8 },
}

/// One macro keypad.
///
/// Host requests ([`Keypad::handle_report`]) and input polling
/// ([`Keypad::poll`]) both run on the caller's task, so the configuration is
/// never shared.
pub struct Keypad<S, H, D, L> {
    store: ConfigStore<S>,
    protocol: ProtocolHandler,
    runner: ActionRunner<H, D>,
    leds: LedPresenter<L>,
    inputs: InputTracker,
    mode: Mode,
    /// Action captured when each button went down, released on the way up.
    held: [Option<Action>; BUTTON_COUNT],
}

impl<S, H, D, L> Keypad<S, H, D, L>
where
    S: Storage,
    H: HidSink,
    D: DelayNs,
    L: LedOutput,
{
    /// `initial` is the pin state at boot, so the encoder does not count a
    /// phantom step on the first poll.
    pub fn new(store: ConfigStore<S>, hid: H, delay: D, leds: L, initial: &InputSnapshot) -> Self {
        Self {
            store,
            protocol: ProtocolHandler::new(),
            runner: ActionRunner::new(hid, delay),
            leds: LedPresenter::new(leds),
            inputs: InputTracker::new(initial),
            mode: Mode::Normal,
            held: [None; BUTTON_COUNT],
        }
    }

    /// Serve one Feature Report from the host.
    pub fn handle_report(&mut self, data: &[u8]) -> Option<Response> {
        self.protocol.handle(data, &mut self.store)
    }

    /// Run one poll cycle: inputs, actions, then LEDs.
    pub async fn poll(&mut self, snapshot: &InputSnapshot, now_ms: u64) {
        let events = self.inputs.update(snapshot, now_ms);

        if events.long_press {
            self.toggle_slot_switch();
        }
        if let Some(rotation) = events.rotation {
            self.on_rotation(rotation).await;
        }
        for (index, edge) in events.buttons.into_iter().enumerate() {
            if let Some(edge) = edge {
                self.on_button(index, edge).await;
            }
        }

        self.refresh_leds().await;
    }

    fn toggle_slot_switch(&mut self) {
        match self.mode {
            Mode::Normal => {
                let selection = self.store.config().active_slot;
                info!("slot switch mode, current slot {}", selection);
                self.mode = Mode::SlotSwitch { selection };
            }
            Mode::SlotSwitch { selection } => {
                match self.store.update(true, |config| config.active_slot = selection) {
                    Ok(()) => info!("slot {} selected", selection),
                    Err(e) => warn!("could not save slot {}: {:?}", selection, e),
                }
                self.mode = Mode::Normal;
            }
        }
    }

    async fn on_rotation(&mut self, rotation: Rotation) {
        let slots = SLOT_COUNT as u8;
        if let Mode::SlotSwitch { selection } = &mut self.mode {
            *selection = match rotation {
                Rotation::Clockwise => (*selection + 1) % slots,
                Rotation::CounterClockwise => (*selection + slots - 1) % slots,
            };
            return;
        }
        let input = match rotation {
            Rotation::Clockwise => Input::EncoderCw,
            Rotation::CounterClockwise => Input::EncoderCcw,
        };
        let action = *self.store.config().active().action(input);
        self.run(&action, Phase::Press).await;
    }

    async fn on_button(&mut self, index: usize, edge: Edge) {
        match edge {
            Edge::Pressed => {
                if self.mode != Mode::Normal {
                    return;
                }
                let action = self.store.config().active().actions[index];
                self.held[index] = Some(action);
                self.run(&action, Phase::Press).await;
            }
            Edge::Released => {
                if let Some(action) = self.held[index].take() {
                    self.run(&action, Phase::Release).await;
                }
            }
        }
    }

    async fn run(&mut self, action: &Action, phase: Phase) {
        debug!("{:?} {:?}", phase, action.kind());
        if let Err(e) = self.runner.execute(action, phase).await {
            warn!("hid output failed: {:?}", e);
        }
    }

    async fn refresh_leds(&mut self) {
        let config = self.store.config();
        let frame = match self.mode {
            Mode::SlotSwitch { selection } => render_selection(selection, config.brightness),
            Mode::Normal => {
                // Only presses that ran an action light the active colour.
                let pressed: [bool; BUTTON_COUNT] = core::array::from_fn(|i| self.held[i].is_some());
                render_slot(config.active(), &pressed, config.brightness)
            }
        };
        if let Err(e) = self.leds.show(frame).await {
            warn!("led update failed: {:?}", e);
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    pub fn hid(&self) -> &H {
        self.runner.hid()
    }

    pub fn leds(&self) -> &L {
        self.leds.output()
    }
}
