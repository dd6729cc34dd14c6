use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    num::NonZero,
    sync::Arc,
    thread::{self, JoinHandle},
};

use flume::{Receiver, Sender};

/// Runs units of work on a fixed pool of workers, each with its own state.
///
/// Every worker calls `init` once when it starts and then hands a mutable
/// reference to the resulting state to `f` for each input it processes. The
/// state lives exactly as long as the worker: it is dropped when the worker
/// runs out of inputs. This is what lets a render worker keep a formatter
/// cache that no other thread ever sees.
///
/// When created with `threads == 1`, no threads are spawned. `init` is called
/// immediately, and `Parallel::send` runs the work inline on the caller's
/// thread.
///
/// The `done` function is always called on the outputs of `f` in the same
/// order that the corresponding inputs were given to `Parallel::send`, no
/// matter which worker finished first.
///
/// Inputs are streamed, so output starts appearing before all inputs have
/// been read. The closures must be `'static`, which means borrowed data
/// needs to be wrapped in an `Arc` first, even in single threaded mode.
pub struct Parallel<I, O, S> {
    kind: ParallelKind<I, O, S>,
}

impl<I, O, S> Parallel<I, O, S>
where
    I: Send + 'static,
    O: Send + 'static,
    S: 'static,
{
    /// Create a new pool that runs `f` on `threads` workers. After each
    /// `f` is run, its output is sent back and `done` is called on it. If
    /// `done` reports an error, then the pool stops and `wait` returns that
    /// error.
    pub fn new(
        threads: NonZero<usize>,
        init: impl Fn() -> S + Send + Sync + 'static,
        f: impl Fn(&mut S, I) -> O + Send + Sync + 'static,
        done: impl FnMut(O) -> anyhow::Result<bool> + Send + Sync + 'static,
    ) -> Parallel<I, O, S> {
        let done = Box::new(done);
        if threads.get() == 1 {
            let kind =
                ParallelKind::Single { state: init(), f: Box::new(f), done };
            return Parallel { kind };
        }

        let (inputs_send, inputs_recv) = flume::bounded(threads.get());
        let (outputs_send, outputs_recv) = flume::bounded(threads.get());
        let init = Arc::new(init);
        let f = Arc::new(f);
        let mut workers = vec![];
        for id in 0..threads.get() {
            workers.push(Worker::run(
                id,
                inputs_recv.clone(),
                outputs_send.clone(),
                init.clone(),
                f.clone(),
            ));
        }
        let done = Done::run(outputs_recv, done);
        let kind = ParallelKind::Multi {
            sequence: 0,
            inputs: inputs_send,
            workers,
            done,
        };
        Parallel { kind }
    }

    /// Queue a unit of work.
    ///
    /// In single threaded mode, the unit of work is run synchronously. This
    /// returns `false` when the pool has stopped accepting work.
    pub fn send(&mut self, value: I) -> anyhow::Result<bool> {
        match self.kind {
            ParallelKind::Single { ref mut state, ref f, ref mut done } => {
                done(f(state, value))
            }
            ParallelKind::Multi { ref mut sequence, ref inputs, .. } => {
                let input = Input { sequence: *sequence, value };
                *sequence += 1;
                Ok(inputs.send(input).is_ok())
            }
        }
    }

    /// Wait until all outstanding units of work have finished and return an
    /// error if `done` failed on any of them.
    ///
    /// Callers should only call this after every input has been sent.
    pub fn wait(self) -> anyhow::Result<()> {
        match self.kind {
            ParallelKind::Single { .. } => Ok(()),
            ParallelKind::Multi { inputs, workers, done, .. } => {
                // Closing the input channel lets the workers drain and
                // retire, which in turn closes the output channel.
                drop(inputs);
                for worker in workers {
                    // propagate panics from the worker
                    worker.handle.join().unwrap();
                }
                done.handle.join().unwrap()
            }
        }
    }
}

type WorkFn<I, O, S> = dyn Fn(&mut S, I) -> O + Send + Sync + 'static;

type DoneFn<O> = dyn FnMut(O) -> anyhow::Result<bool> + Send + Sync + 'static;

enum ParallelKind<I, O, S> {
    Single {
        state: S,
        f: Box<WorkFn<I, O, S>>,
        done: Box<DoneFn<O>>,
    },
    Multi {
        sequence: u64,
        inputs: Sender<Input<I>>,
        workers: Vec<Worker>,
        done: Done,
    },
}

struct Worker {
    handle: JoinHandle<()>,
}

impl Worker {
    fn run<I, O, S>(
        id: usize,
        inputs: Receiver<Input<I>>,
        outputs: Sender<Output<O>>,
        init: Arc<dyn Fn() -> S + Send + Sync + 'static>,
        f: Arc<WorkFn<I, O, S>>,
    ) -> Worker
    where
        I: Send + 'static,
        O: Send + 'static,
        S: 'static,
    {
        let handle = thread::spawn(move || {
            let mut state = init();
            let mut processed = 0u64;
            for input in inputs {
                let sequence = input.sequence;
                let value = f(&mut state, input.value);
                processed += 1;
                // The `done` thread quit early because of an error, so
                // nobody is listening anymore.
                if outputs.send(Output { sequence, value }).is_err() {
                    break;
                }
            }
            log::trace!("worker {id} retiring after {processed} unit(s)");
        });
        Worker { handle }
    }
}

struct Done {
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Done {
    fn run<O>(outputs: Receiver<Output<O>>, mut done: Box<DoneFn<O>>) -> Done
    where
        O: Send + 'static,
    {
        let handle = thread::spawn(move || {
            let mut sequence = 0;
            let mut queue: BinaryHeap<Output<O>> = BinaryHeap::new();
            for output in outputs {
                queue.push(output);
                while queue.peek().is_some_and(|o| o.sequence == sequence) {
                    let o = queue.pop().unwrap();
                    if !done(o.value)? {
                        return Ok(());
                    }
                    sequence += 1;
                }
            }
            Ok(())
        });
        Done { handle }
    }
}

/// An input tagged with a monotonically increasing sequence number.
struct Input<V> {
    sequence: u64,
    value: V,
}

/// An output tagged with the sequence number of the input that produced it.
///
/// `Ord` is reversed on `sequence` so that `BinaryHeap` acts as a min-heap.
struct Output<V> {
    sequence: u64,
    value: V,
}

impl<V> Eq for Output<V> {}

impl<V> PartialEq for Output<V> {
    fn eq(&self, rhs: &Output<V>) -> bool {
        self.sequence == rhs.sequence
    }
}

impl<V> Ord for Output<V> {
    fn cmp(&self, rhs: &Output<V>) -> Ordering {
        self.sequence.cmp(&rhs.sequence).reverse()
    }
}

impl<V> PartialOrd for Output<V> {
    fn partial_cmp(&self, rhs: &Output<V>) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}
