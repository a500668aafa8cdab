//! 物理步进策略
//!
//! [`InlineStepper`] 在当前线程执行；[`OffloadedStepper`] 把前三步交给后台线程，
//! 按请求序号匹配响应，过期响应直接丢弃。
//! 后台线程超时、断开或不可用时返回错误，由模拟切换到 `InlineStepper`。

use super::particle::Particle;
use super::physics::{step_all, PhysicsParams};
use crate::core::{WorkerError, WorkerResult};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use glam::Vec2;
use std::thread;
use std::time::{Duration, Instant};

/// 步进策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperKind {
    Inline,
    Offloaded,
}

/// 物理步进策略
pub trait PhysicsStepper: Send {
    /// 对粒子数组执行吸引、摩擦、积分
    ///
    /// 返回 `Err` 时 `particles` 保持调用前的状态。
    fn step(&mut self, particles: &mut Vec<Particle>, pointer: Option<Vec2>, params: &PhysicsParams) -> WorkerResult<()>;

    fn kind(&self) -> StepperKind;
}

/// 当前线程步进
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStepper;

impl PhysicsStepper for InlineStepper {
    fn step(&mut self, particles: &mut Vec<Particle>, pointer: Option<Vec2>, params: &PhysicsParams) -> WorkerResult<()> {
        step_all(particles, pointer, params);
        Ok(())
    }

    fn kind(&self) -> StepperKind {
        StepperKind::Inline
    }
}

/// 请求：当前粒子数组与指针位置
struct StepRequest {
    sequence: u64,
    particles: Vec<Particle>,
    pointer: Option<Vec2>,
    params: PhysicsParams,
}

/// 响应：更新后的粒子数组
struct StepResponse {
    sequence: u64,
    particles: Vec<Particle>,
}

/// 后台线程步进
pub struct OffloadedStepper {
    requests: Option<Sender<StepRequest>>,
    responses: Receiver<StepResponse>,
    next_sequence: u64,
    timeout: Duration,
}

impl OffloadedStepper {
    /// 启动使用标准物理步骤的后台线程
    pub fn spawn(timeout: Duration) -> WorkerResult<Self> {
        Self::spawn_with(timeout, step_all)
    }

    /// 启动执行自定义步骤的后台线程
    pub fn spawn_with<F>(timeout: Duration, mut step: F) -> WorkerResult<Self>
    where
        F: FnMut(&mut [Particle], Option<Vec2>, &PhysicsParams) + Send + 'static,
    {
        let (request_sender, request_receiver) = unbounded::<StepRequest>();
        let (response_sender, response_receiver) = unbounded::<StepResponse>();

        thread::Builder::new()
            .name("particle-physics".to_string())
            .spawn(move || {
                for mut request in request_receiver.iter() {
                    step(request.particles.as_mut_slice(), request.pointer, &request.params);
                    let response = StepResponse {
                        sequence: request.sequence,
                        particles: request.particles,
                    };
                    if response_sender.send(response).is_err() {
                        return;
                    }
                }
            })
            .map_err(|e| WorkerError::Unavailable(e.to_string()))?;

        tracing::debug!(target: "simulation", timeout_ms = timeout.as_millis() as u64, "物理线程已启动");

        Ok(Self {
            requests: Some(request_sender),
            responses: response_receiver,
            next_sequence: 0,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PhysicsStepper for OffloadedStepper {
    fn step(&mut self, particles: &mut Vec<Particle>, pointer: Option<Vec2>, params: &PhysicsParams) -> WorkerResult<()> {
        let sender = self.requests.as_ref().ok_or(WorkerError::Disconnected)?;

        self.next_sequence += 1;
        let sequence = self.next_sequence;
        sender
            .send(StepRequest {
                sequence,
                particles: particles.clone(),
                pointer,
                params: *params,
            })
            .map_err(|_| WorkerError::Disconnected)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(response) if response.sequence == sequence => {
                    if response.particles.len() != particles.len() {
                        return Err(WorkerError::Unavailable(format!(
                            "expected {} particles, got {}",
                            particles.len(),
                            response.particles.len()
                        )));
                    }
                    *particles = response.particles;
                    return Ok(());
                }
                Ok(response) if response.sequence < sequence => {
                    tracing::trace!(target: "simulation", stale = response.sequence, current = sequence, "丢弃过期响应");
                }
                Ok(response) => {
                    return Err(WorkerError::OutOfSequence {
                        expected: sequence,
                        actual: response.sequence,
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(WorkerError::Timeout(self.timeout.as_millis() as u64));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(WorkerError::Disconnected),
            }
        }
    }

    fn kind(&self) -> StepperKind {
        StepperKind::Offloaded
    }
}

impl Drop for OffloadedStepper {
    fn drop(&mut self) {
        // 关闭请求通道，线程处理完当前请求后退出
        self.requests.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn params() -> PhysicsParams {
        PhysicsParams {
            interaction_radius: 50.0,
            magnetic_force: 0.4,
            friction: 0.97,
            interactive: true,
        }
    }

    fn particles() -> Vec<Particle> {
        (0..16)
            .map(|i| Particle {
                position: Vec2::new(10.0 + i as f32, 20.0),
                velocity: Vec2::new(1.0, -0.5),
                radius: 2.0,
                ..Particle::default()
            })
            .collect()
    }

    #[test]
    fn test_offloaded_matches_inline() {
        let mut inline = particles();
        let mut offloaded = particles();
        let pointer = Some(Vec2::new(30.0, 25.0));

        InlineStepper.step(&mut inline, pointer, &params()).unwrap();
        let mut stepper = OffloadedStepper::spawn(Duration::from_secs(2)).unwrap();
        stepper.step(&mut offloaded, pointer, &params()).unwrap();

        assert_eq!(inline, offloaded);
        assert_eq!(stepper.kind(), StepperKind::Offloaded);
    }

    #[test]
    fn test_timeout_leaves_particles_untouched() {
        let mut stepper = OffloadedStepper::spawn_with(Duration::from_millis(10), |_, _, _| {
            thread::sleep(Duration::from_millis(200));
        })
        .unwrap();

        let mut state = particles();
        let before = state.clone();
        assert_eq!(stepper.step(&mut state, None, &params()), Err(WorkerError::Timeout(10)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_panicking_worker_disconnects() {
        let mut stepper =
            OffloadedStepper::spawn_with(Duration::from_secs(2), |_, _, _| panic!("worker crashed")).unwrap();

        let mut state = particles();
        let before = state.clone();
        assert_eq!(stepper.step(&mut state, None, &params()), Err(WorkerError::Disconnected));
        assert_eq!(state, before);
    }

    #[test]
    fn test_stale_responses_are_discarded() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut stepper = OffloadedStepper::spawn_with(Duration::from_millis(20), move |particles, _, _| {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                thread::sleep(Duration::from_millis(60));
            }
            for particle in particles.iter_mut() {
                particle.radius = call as f32;
            }
        })
        .unwrap();

        let mut state = particles();
        assert!(matches!(stepper.step(&mut state, None, &params()), Err(WorkerError::Timeout(_))));

        // 等第一个请求的响应进入队列
        thread::sleep(Duration::from_millis(100));
        stepper.step(&mut state, None, &params()).unwrap();
        assert!(state.iter().all(|p| p.radius == 2.0));
    }
}
