//! Integration tests for the compiler instance controller

mod common;
use common::{
    method, started_compiler, startup, BlobCache, FatalRecorder, RejectingBackend,
    BLOB_OVERHEAD,
};
use jitctl::compiler::{
    AltCompiler, CompileEnv, CompileQueue, CompileRequest, CompiledCode, CompilerBackend,
    CompilerState, DirectiveSet, EntryBci, MethodDescriptor, ThreadedBroker, BOOTSTRAP_HOLDER,
    BOOTSTRAP_METHODS,
};
use jitctl::Error;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

const PRODUCT: &str = "-XX:+EnableJVMCIProduct";
const UNLOCK: &str = "-XX:+UnlockExperimentalVMOptions";
const BOOTSTRAP: &str = "-XX:+BootstrapJVMCI";

fn wait_until_empty(queue: &dyn CompileQueue) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !queue.is_empty() {
        assert!(Instant::now() < deadline, "compile queue did not drain");
        thread::sleep(Duration::from_millis(1));
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_compiles_are_all_counted() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;
        const SIZE: usize = 40;

        let (_ctx, compiler) = started_compiler(&[PRODUCT], SIZE);
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let compiler = Arc::clone(&compiler);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let env = CompileEnv::new((t * PER_THREAD + i) as u64);
                        compiler
                            .compile_method(&env, &method(i), EntryBci::Invocation, DirectiveSet::empty())
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let n = (THREADS * PER_THREAD) as u64;
        let snap = compiler.code_install_stats(false).snapshot();
        assert_eq!(snap.count, n);
        assert_eq!(snap.code_size, n * SIZE as u64);
        assert_eq!(snap.total_size, n * (SIZE + BLOB_OVERHEAD) as u64);
        assert_eq!(compiler.methods_compiled(), n);
        assert_eq!(compiler.global_compilation_ticks(), n);
        assert_eq!(compiler.code_install_stats(true).count(), 0);
    }

    #[test]
    fn test_broker_workers_drain_queue() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT, "-XX:JVMCIThreads=4"], 16);
        assert_eq!(compiler.config().threads, 4);

        let broker = ThreadedBroker::start(
            "C2",
            Arc::clone(&compiler),
            compiler.config().threads,
            Duration::from_millis(10),
        )
        .unwrap();
        for i in 0..500 {
            let request = if i % 5 == 0 {
                CompileRequest::osr(method(i), 3)
            } else {
                CompileRequest::new(method(i))
            };
            broker.queue().enqueue(request).unwrap();
        }
        wait_until_empty(broker.queue());
        broker.shutdown();

        assert_eq!(compiler.methods_compiled(), 500);
        assert_eq!(compiler.code_install_stats(false).count(), 500);
        assert_eq!(compiler.stopped_compiler_threads(), 4);
    }

    #[test]
    fn test_print_timers_during_installs() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        let writer = {
            let compiler = Arc::clone(&compiler);
            thread::spawn(move || {
                for i in 0..200 {
                    compiler
                        .compile_method(&CompileEnv::new(i), &method(i as usize), EntryBci::Invocation, DirectiveSet::empty())
                        .unwrap();
                }
            })
        };
        for _ in 0..20 {
            let mut out = Vec::new();
            compiler.print_timers(&mut out).unwrap();
            assert!(String::from_utf8(out).unwrap().contains("installs: "));
        }
        writer.join().unwrap();
        assert_eq!(compiler.methods_compiled(), 200);
    }
}

mod bootstrap {
    use super::*;

    /// Panics while lowering one method name
    struct PanickingBackend {
        reject: &'static str,
    }

    impl CompilerBackend for PanickingBackend {
        fn compile(
            &self,
            _env: &CompileEnv,
            method: &MethodDescriptor,
            _entry_bci: EntryBci,
            _directives: DirectiveSet,
        ) -> anyhow::Result<CompiledCode> {
            if method.name == self.reject {
                panic!("lowering {} blew up", method.name);
            }
            Ok(CompiledCode {
                instructions: vec![0xcc; 8],
                data_size: 0,
            })
        }
    }

    /// Records what the compiler reports while each method compiles
    #[derive(Default)]
    struct ObservingBackend {
        compiler: OnceLock<Weak<AltCompiler>>,
        seen: Mutex<Vec<(String, bool, bool)>>,
    }

    impl CompilerBackend for ObservingBackend {
        fn compile(
            &self,
            _env: &CompileEnv,
            method: &MethodDescriptor,
            _entry_bci: EntryBci,
            _directives: DirectiveSet,
        ) -> anyhow::Result<CompiledCode> {
            if let Some(compiler) = self.compiler.get().and_then(Weak::upgrade) {
                self.seen.lock().unwrap().push((
                    method.to_string(),
                    compiler.is_bootstrapping(),
                    compiler.force_comp_at_level_simple(method),
                ));
            }
            Ok(CompiledCode {
                instructions: vec![0xcc; 8],
                data_size: 0,
            })
        }
    }

    /// Run bootstrap on another thread so a stalled queue fails the test
    fn bootstrap_within(compiler: &Arc<AltCompiler>, broker: &ThreadedBroker) -> jitctl::Result<u64> {
        let (tx, rx) = mpsc::channel();
        let compiler = Arc::clone(compiler);
        let queue = broker.queue().clone();
        thread::spawn(move || {
            let _ = tx.send(compiler.bootstrap(&queue));
        });
        rx.recv_timeout(Duration::from_secs(30))
            .expect("bootstrap did not finish")
    }

    #[test]
    fn test_backend_panic_during_bootstrap() {
        let recorder = Arc::new(FatalRecorder::default());
        let mut ctx = startup(&[PRODUCT, UNLOCK, BOOTSTRAP])
            .unwrap()
            .with_fatal_handler(recorder.clone());
        let compiler = ctx
            .create_compiler(Arc::new(PanickingBackend { reject: "equals" }), Arc::new(BlobCache))
            .unwrap();
        compiler.initialize().unwrap();

        let broker = ThreadedBroker::start("JVMCI", Arc::clone(&compiler), 1, Duration::from_millis(10))
            .unwrap();
        let compiled = bootstrap_within(&compiler, &broker).unwrap();

        assert_eq!(compiled, BOOTSTRAP_METHODS.len() as u64 - 1);
        assert!(broker.queue().is_empty());
        assert_eq!(compiler.state(), CompilerState::Active);
        assert_eq!(
            recorder.messages.lock().unwrap().as_slice(),
            [format!(
                "Fatal error during compilation of {}.equals(Ljava/lang/Object;)Z: backend panicked: lowering equals blew up",
                BOOTSTRAP_HOLDER
            )]
        );

        // The worker survived and keeps serving the queue
        broker.queue().enqueue(CompileRequest::new(method(1))).unwrap();
        wait_until_empty(broker.queue());
        broker.shutdown();
        assert_eq!(compiler.methods_compiled(), BOOTSTRAP_METHODS.len() as u64);
        assert_eq!(compiler.stopped_compiler_threads(), 1);
    }

    #[test]
    fn test_bootstrapping_visible_to_compiles() {
        let backend = Arc::new(ObservingBackend::default());
        let mut ctx = startup(&[PRODUCT, UNLOCK, BOOTSTRAP]).unwrap();
        let compiler = ctx
            .create_compiler(backend.clone(), Arc::new(BlobCache))
            .unwrap();
        backend.compiler.set(Arc::downgrade(&compiler)).unwrap();
        compiler.initialize().unwrap();

        let broker = ThreadedBroker::start("JVMCI", Arc::clone(&compiler), 2, Duration::from_millis(10))
            .unwrap();
        bootstrap_within(&compiler, &broker).unwrap();
        broker.queue().enqueue(CompileRequest::new(method(3))).unwrap();
        broker.queue().enqueue(CompileRequest::new(MethodDescriptor::new(
            "jdk.vm.ci.runtime.JVMCI",
            "getRuntime",
            "()Ljdk/vm/ci/runtime/JVMCIRuntime;",
        )))
        .unwrap();
        wait_until_empty(broker.queue());
        broker.shutdown();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), BOOTSTRAP_METHODS.len() + 2);
        let (during, after) = seen.split_at(BOOTSTRAP_METHODS.len());
        for (method, bootstrapping, simple) in during {
            assert!(*bootstrapping, "{} compiled outside bootstrap", method);
            // Seed methods are not compiler classes
            assert!(!*simple, "{}", method);
        }
        assert!(after.iter().all(|(_, bootstrapping, simple)| !bootstrapping && !simple));
    }

    #[test]
    fn test_bootstrap_through_broker() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT, UNLOCK, BOOTSTRAP], 32);
        assert_eq!(compiler.state(), CompilerState::Bootstrapping);

        let broker = ThreadedBroker::start("JVMCI", Arc::clone(&compiler), 2, Duration::from_millis(10))
            .unwrap();
        let compiled = compiler.bootstrap(broker.queue()).unwrap();

        assert_eq!(compiled, BOOTSTRAP_METHODS.len() as u64);
        assert_eq!(compiler.state(), CompilerState::Active);
        assert!(!compiler.is_bootstrapping());
        assert!(compiler.bootstrap_compilation_request_handled());
        assert!(matches!(
            compiler.bootstrap(broker.queue()),
            Err(Error::InvalidState { .. })
        ));

        // Later empty-queue callbacks do not change anything
        broker.queue().enqueue(CompileRequest::new(method(0))).unwrap();
        wait_until_empty(broker.queue());
        assert!(compiler.bootstrap_compilation_request_handled());
    }

    #[test]
    fn test_empty_queue_outside_bootstrap_is_ignored() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        let broker = ThreadedBroker::start("JVMCI", Arc::clone(&compiler), 1, Duration::from_millis(1))
            .unwrap();
        thread::sleep(Duration::from_millis(20));
        broker.shutdown();
        assert!(!compiler.bootstrap_compilation_request_handled());
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_shutdown_rejects_compiles() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        compiler
            .compile_method(&CompileEnv::new(1), &method(1), EntryBci::Osr(2), DirectiveSet::empty())
            .unwrap();
        compiler.shutdown();
        assert_eq!(compiler.state(), CompilerState::Stopped);
        let err = compiler
            .compile_method(&CompileEnv::new(2), &method(2), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert!(!err.is_fatal());
        assert_eq!(compiler.methods_compiled(), 1);
    }

    #[test]
    fn test_ticks_are_shared() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let compiler = Arc::clone(&compiler);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        compiler.inc_global_compilation_ticks();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(compiler.global_compilation_ticks(), 4000);
    }

    #[test]
    fn test_hosted_installs_tracked_separately() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        let hosted = CompileEnv {
            compile_id: 1,
            hosted: true,
        };
        compiler
            .compile_method(&hosted, &method(1), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap();
        assert_eq!(compiler.code_install_stats(true).count(), 1);
        assert_eq!(compiler.code_install_stats(false).count(), 0);
    }

    #[test]
    fn test_compile_failure_reaches_fatal_handler() {
        let recorder = Arc::new(FatalRecorder::default());
        let mut ctx = startup(&[PRODUCT]).unwrap().with_fatal_handler(recorder.clone());
        let compiler = ctx
            .create_compiler(
                Arc::new(RejectingBackend {
                    size: 8,
                    reject: "m13",
                }),
                Arc::new(BlobCache),
            )
            .unwrap();
        compiler.initialize().unwrap();

        compiler
            .compile_method(&CompileEnv::new(1), &method(12), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap();
        let err = compiler
            .compile_method(&CompileEnv::new(2), &method(13), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            recorder.messages.lock().unwrap().as_slice(),
            ["Fatal error during compilation of Workload.m13()V: cannot compile m13"]
        );
        assert_eq!(compiler.methods_compiled(), 1);
    }

    #[test]
    fn test_name_reflects_mode() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        assert_eq!(compiler.name(), "JVMCI");
        assert!(compiler.supports_osr());
    }

    #[test]
    fn test_fresh_compiler_has_zero_stats() {
        let (_ctx, compiler) = started_compiler(&[PRODUCT], 8);
        let snap = compiler.code_install_stats(false).snapshot();
        assert_eq!(snap.count, 0);
        assert_eq!(snap.total_size, 0);
        assert_eq!(compiler.global_compilation_ticks(), 0);
    }
}
