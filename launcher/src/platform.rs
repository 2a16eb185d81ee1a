//! Boot platform for dry runs on the host.
//!
//! Performs no hardware access. The handoff is captured so the caller can
//! write the block out for the bootstub to be tested against.

use swanboot_core::BootPlatform;
use swanboot_core::vblank::{VBLANK_TICKS, VblankCounter};
use swanboot_shared::{FarPointer, HandoffBlock};

/// What the bootstub would have been started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunHandoff {
    pub block: HandoffBlock,
    pub code_len: usize,
    pub load_address: u16,
    pub entry: FarPointer,
}

pub struct DryRunPlatform {
    color: bool,
    frames: &'static VblankCounter,
}

impl DryRunPlatform {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            frames: &VBLANK_TICKS,
        }
    }
}

impl BootPlatform for DryRunPlatform {
    type Transfer = DryRunHandoff;

    fn blank_display(&mut self) {
        tracing::debug!("display off");
    }

    fn wait_for_vblank(&mut self) {
        // No display interrupt on the host: each halt stands in for one frame.
        self.frames.wait_for_vblank(|| self.frames.tick());
    }

    fn disable_interrupts(&mut self) {
        tracing::debug!(frames = self.frames.ticks(), "interrupts off");
    }

    fn color_supported(&self) -> bool {
        self.color
    }

    fn enable_color_mode(&mut self) {
        tracing::debug!("color mode on");
    }

    fn decompress_to_vram(&mut self, address: u16, packed: &[u8]) {
        tracing::debug!(
            address = format_args!("{address:#06x}"),
            packed = packed.len(),
            "tiles to VRAM"
        );
    }

    fn transfer(
        &mut self,
        code: &[u8],
        load_address: u16,
        entry: FarPointer,
        block: &HandoffBlock,
    ) -> DryRunHandoff {
        DryRunHandoff {
            block: *block,
            code_len: code.len(),
            load_address,
            entry,
        }
    }
}
