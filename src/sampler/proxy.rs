//! Read-only front-end sharing a pipeline
//!
//! Several agents can observe the same audio through proxies. Each proxy
//! relays enablement and subscriptions to its target and reads the target's
//! buffer. It owns no buffer and cannot step or reset the target. Observers
//! subscribed through a proxy read the buffer handed to the callback; proxy
//! reads fail while the target is mid-step.

use crate::error::SensorError;
use crate::features::shape::ObservationShape;
use crate::io::capture::AudioCapture;
use crate::io::sample_buffer::ObservationTensor;
use crate::sampler::observer::{AudioSampler, ObserverId, StepObserver};
use crate::sampler::pipeline::SamplingPipeline;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Suffix appended to the target's name
pub const PROXY_SUFFIX: &str = "_Proxy";

/// Proxy onto a shared [`SamplingPipeline`]
pub struct SamplerProxy<C: AudioCapture> {
    target: Rc<RefCell<SamplingPipeline<C>>>,
}

impl<C: AudioCapture> Clone for SamplerProxy<C> {
    fn clone(&self) -> Self {
        Self {
            target: Rc::clone(&self.target),
        }
    }
}

impl<C: AudioCapture> std::fmt::Debug for SamplerProxy<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = self.target.try_borrow().ok();
        f.debug_struct("SamplerProxy")
            .field("target", &target.as_ref().map(|t| t.sensor_name()))
            .finish()
    }
}

impl<C: AudioCapture> SamplerProxy<C> {
    /// Proxy onto `target`
    pub fn new(target: Rc<RefCell<SamplingPipeline<C>>>) -> Self {
        log::debug!("Creating proxy for '{}'", target.borrow().sensor_name());
        Self { target }
    }

    /// Target name with the proxy suffix
    pub fn name(&self) -> String {
        format!("{}{}", self.target.borrow().sensor_name(), PROXY_SUFFIX)
    }

    /// The shared target
    pub fn target(&self) -> &Rc<RefCell<SamplingPipeline<C>>> {
        &self.target
    }

    fn read_target(&self) -> Result<Ref<'_, SamplingPipeline<C>>, SensorError> {
        self.target.try_borrow().map_err(|_| {
            SensorError::ProcessingError(
                "target is mid-step; read the buffer passed to the observer".to_string(),
            )
        })
    }

    /// Shape of the target's observation
    pub fn shape(&self) -> Result<ObservationShape, SensorError> {
        Ok(self.read_target()?.shape())
    }

    /// Copy of the target's current observation
    ///
    /// Fails while the target is stepping, e.g. from inside a step observer.
    pub fn observation(&self) -> Result<ObservationTensor, SensorError> {
        Ok(self.read_target()?.observation())
    }

    /// Write the target's observation in `(height, width, channels)` order
    pub fn write_observation(&self, out: &mut [f32]) -> Result<usize, SensorError> {
        self.read_target()?.write_observation(out)
    }
}

impl<C: AudioCapture> AudioSampler for SamplerProxy<C> {
    fn sampling_enabled(&self) -> bool {
        self.target.borrow().sampling_enabled()
    }

    fn set_sampling_enabled(&mut self, enabled: bool) {
        self.target.borrow_mut().set_sampling_enabled(enabled);
    }

    fn subscribe(&mut self, observer: Box<dyn StepObserver>) -> ObserverId {
        self.target.borrow_mut().subscribe(observer)
    }

    fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.target.borrow_mut().unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SampleType, SensorConfig, SignalType};
    use crate::io::capture::BlockCapture;
    use crate::io::sample_buffer::TemporalRingBuffer;

    fn shared_pipeline() -> Rc<RefCell<SamplingPipeline<BlockCapture>>> {
        let mut config = SensorConfig::default();
        config.set_sensor_name("Mic");
        config.set_sample_type(SampleType::Amplitude);
        config.set_signal_type(SignalType::Mono);
        config.set_buffer_length(2);
        let mut capture = BlockCapture::new(48000);
        capture.push_mono(&vec![1.0; 2048]);
        Rc::new(RefCell::new(SamplingPipeline::new(config, capture)))
    }

    #[test]
    fn test_proxy_name() {
        let proxy = SamplerProxy::new(shared_pipeline());
        assert_eq!(proxy.name(), "Mic_Proxy");
    }

    #[test]
    fn test_enablement_is_relayed() {
        let target = shared_pipeline();
        let mut proxy = SamplerProxy::new(Rc::clone(&target));
        assert!(!proxy.sampling_enabled(), "sampling starts disabled");

        proxy.set_sampling_enabled(true);
        assert!(target.borrow().sampling_enabled());
        target.borrow_mut().set_sampling_enabled(false);
        assert!(!proxy.sampling_enabled());
    }

    #[test]
    fn test_proxy_reads_target_buffer() {
        let target = shared_pipeline();
        let mut proxy = SamplerProxy::new(Rc::clone(&target));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = proxy.subscribe(Box::new(
            move |step: usize, complete: bool, _: &TemporalRingBuffer| {
                sink.borrow_mut().push((step, complete));
            },
        ));

        proxy.set_sampling_enabled(true);
        target.borrow_mut().step().unwrap();

        assert_eq!(*seen.borrow(), vec![(0, false)]);
        assert_eq!(proxy.shape().unwrap(), target.borrow().shape());
        let observation = proxy.observation().unwrap();
        assert_eq!(observation.get(0, 0, 0), 1.0);
        assert_eq!(observation.get(0, 0, 1), 0.0, "second step not sampled yet");

        let mut out = vec![0.0; proxy.shape().unwrap().len()];
        assert_eq!(proxy.write_observation(&mut out).unwrap(), out.len());
        assert!(proxy.unsubscribe(id));
    }

    #[test]
    fn test_observer_reads_window_through_proxy() {
        let target = shared_pipeline();
        let mut proxy = SamplerProxy::new(Rc::clone(&target));
        let reader = proxy.clone();

        let windows = Rc::new(RefCell::new(Vec::new()));
        let proxy_reads = Rc::new(RefCell::new(Vec::new()));
        let (window_sink, read_sink) = (Rc::clone(&windows), Rc::clone(&proxy_reads));
        proxy.subscribe(Box::new(
            move |_: usize, complete: bool, buffer: &TemporalRingBuffer| {
                if complete {
                    window_sink.borrow_mut().push(buffer.to_tensor());
                    read_sink.borrow_mut().push(reader.observation().is_err());
                }
            },
        ));

        proxy.set_sampling_enabled(true);
        target.borrow_mut().step().unwrap();
        target.borrow_mut().step().unwrap();

        assert_eq!(windows.borrow().len(), 1, "window completes on the second step");
        assert_eq!(windows.borrow()[0], proxy.observation().unwrap());
        assert_eq!(*proxy_reads.borrow(), vec![true], "mid-step proxy read is an error");
    }
}
