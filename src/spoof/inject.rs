//! Script delivery: frame/worker propagation and the injection fallback
//! chain.

use crate::browser::PageHook;

use super::profile::SpoofProfile;

/// How the composed script ended up delivered, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionMethod {
    /// Registered with the browser's run-on-new-document primitive.
    InitScript,
    /// Evaluated once in the current document only.
    Evaluate,
    /// Every mechanism failed; the session proceeds unspoofed.
    Skipped,
}

/// Composes the script once and delivers it through the best available
/// mechanism.
#[derive(Debug, Clone)]
pub struct SpoofInjector {
    profile: SpoofProfile,
    script: String,
}

impl SpoofInjector {
    pub fn new(profile: SpoofProfile) -> Self {
        let script = super::compose(&profile);
        Self { profile, script }
    }

    pub fn profile(&self) -> &SpoofProfile {
        &self.profile
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Deliver the script, degrading through the fallback order.
    ///
    /// Preferred: the run-on-new-document primitive, which re-executes the
    /// script on every navigation and subframe before page scripts run.
    /// Fallback: a one-shot evaluation in the current document. If both
    /// fail, registration proceeds without spoofing; a missing injection
    /// primitive must never abort the attempt.
    pub async fn install(&self, hook: &dyn PageHook) -> InjectionMethod {
        match hook.add_init_script(&self.script).await {
            Ok(()) => return InjectionMethod::InitScript,
            Err(err) => {
                tracing::warn!(%err, "init-script injection unavailable, trying evaluate");
            }
        }
        match hook.evaluate(&self.script).await {
            Ok(()) => {
                tracing::warn!("spoof degraded to one-shot evaluation; new documents are bare");
                InjectionMethod::Evaluate
            }
            Err(err) => {
                tracing::warn!(%err, "all injection mechanisms failed, proceeding unspoofed");
                InjectionMethod::Skipped
            }
        }
    }
}

/// Frame and worker propagation, appended after the module bodies.
///
/// Same-origin iframes are patched through a MutationObserver the instant
/// the node enters the DOM; blob-backed workers are rewritten to prepend a
/// reduced worker-safe snippet. The worker path is inherently racy: a
/// worker can start reading `navigator` before the rewritten blob is in
/// place. This is approximate by design, not a guarantee.
pub(crate) fn propagation(profile: &SpoofProfile) -> String {
    let mut script = format!(
        "    // --- frame/worker propagation ---\n    {{\n        \
         const WORKER_PLATFORM = '{platform}';\n        \
         const WORKER_CONCURRENCY = {concurrency};\n        \
         const WORKER_DEVICE_MEMORY = {memory};\n        \
         const WORKER_LOCALE = '{locale}';\n",
        platform = profile.platform,
        concurrency = profile.hardware_concurrency,
        memory = profile.device_memory,
        locale = profile.locale,
    );
    script.push_str(PROPAGATION_BODY);
    script
}

const PROPAGATION_BODY: &str = r#"
        // Reduced spoof for worker scopes: no DOM, so only navigator and
        // timing surfaces matter.
        const WORKER_SNIPPET = [
            'const __origNav = self.navigator;',
            'const __navProxy = new Proxy(__origNav, {',
            '    get(target, prop) {',
            "        if (prop === 'hardwareConcurrency') return " + WORKER_CONCURRENCY + ';',
            "        if (prop === 'deviceMemory') return " + WORKER_DEVICE_MEMORY + ';',
            "        if (prop === 'platform') return '" + WORKER_PLATFORM + "';",
            "        if (prop === 'language') return '" + WORKER_LOCALE + "';",
            "        if (prop === 'languages') return ['" + WORKER_LOCALE + "', 'en'];",
            '        const value = target[prop];',
            "        return typeof value === 'function' ? value.bind(target) : value;",
            '    },',
            '});',
            "try { Object.defineProperty(self, 'navigator', { get: () => __navProxy, configurable: true }); } catch (e) {}",
        ].join('\n');

        // Same-origin iframes: patch through a MutationObserver rather than
        // onload, which fires after frame scripts already saw bare objects.
        const patchFrame = (frame) => {
            try {
                const win = frame.contentWindow;
                if (!win || win.__spoofPatched) return;
                win.__spoofPatched = true;
                try {
                    Object.defineProperty(win.navigator, 'webdriver', {
                        get: () => undefined,
                        configurable: true,
                    });
                } catch (e) {}
                try {
                    win.HTMLCanvasElement.prototype.toDataURL =
                        HTMLCanvasElement.prototype.toDataURL;
                    win.CanvasRenderingContext2D.prototype.getImageData =
                        CanvasRenderingContext2D.prototype.getImageData;
                } catch (e) {}
            } catch (e) {
                // Cross-origin frame: out of reach by design.
            }
        };
        const frameObserver = new MutationObserver((mutations) => {
            for (const mutation of mutations) {
                for (const node of mutation.addedNodes) {
                    if (node.tagName === 'IFRAME') {
                        patchFrame(node);
                        node.addEventListener('load', () => patchFrame(node));
                    }
                    if (node.querySelectorAll) {
                        node.querySelectorAll('iframe').forEach(patchFrame);
                    }
                }
            }
        });
        if (document.documentElement) {
            frameObserver.observe(document.documentElement, { childList: true, subtree: true });
        }
        document.querySelectorAll('iframe').forEach(patchFrame);

        // Blob-backed workers: prepend the worker snippet before the worker
        // script executes. Known race: the rewrite is not atomic with
        // worker startup, so a fast worker may observe bare values.
        if (typeof Worker !== 'undefined') {
            const NativeWorker = Worker;
            const nativeCreateObjectURL = URL.createObjectURL.bind(URL);
            const spoofedWorker = function (scriptUrl, options) {
                if (scriptUrl instanceof Blob) {
                    try {
                        const rewritten = new Blob([WORKER_SNIPPET, '\n', scriptUrl], {
                            type: scriptUrl.type || 'application/javascript',
                        });
                        return new NativeWorker(nativeCreateObjectURL(rewritten), options);
                    } catch (e) {}
                }
                return new NativeWorker(scriptUrl, options);
            };
            spoofedWorker.prototype = NativeWorker.prototype;
            spoofedFunctions.set(spoofedWorker, 'Worker');
            window.Worker = spoofedWorker;
        }
    }
"#;
