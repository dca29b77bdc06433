use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;

/// One playback of a registered sample, read from the start to the end.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub sample_id: SampleId,
    pub pos: usize,
    pub active: bool,
}

impl Voice {
    pub const IDLE: Voice = Voice {
        sample_id: SampleId(0),
        pos: 0,
        active: false,
    };

    pub fn new(sample_id: SampleId) -> Self {
        Self {
            sample_id,
            pos: 0,
            active: true,
        }
    }

    /// Next frame of this voice; deactivates itself past the end of the buffer.
    #[inline]
    pub fn next_frame(&mut self, buffer: &SampleBuffer) -> StereoFrame {
        if !self.active {
            return StereoFrame::zero();
        }
        match buffer.data.get(self.pos) {
            Some(&frame) => {
                self.pos += 1;
                frame
            }
            None => {
                self.active = false;
                StereoFrame::zero()
            }
        }
    }
}
