//! Automation-detection hiding.
//!
//! Runs first in the composed script so no later module executes while an
//! automation marker is still visible.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct AutomationSpoof;

impl SpoofModule for AutomationSpoof {
    fn name(&self) -> &'static str {
        "automation"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        defineGetter(navigator, 'webdriver', undefined);

        // Driver leftovers checked by fingerprinting collectors.
        const windowProps = [
            '__webdriverFunc', 'domAutomation', 'domAutomationController',
            '__lastWatirAlert', '__lastWatirConfirm', '__lastWatirPrompt',
            '_WEBDRIVER_ELEM_CACHE',
            '_phantom', 'callPhantom', 'phantom',
            '__puppeteer_evaluation_script__', '__playwright', '__nightmare',
            'webdriver', '__webdriver_script_func', '__webdriver_script_function',
        ];
        const documentProps = [
            '__selenium_evaluate', '__webdriver_evaluate', '__driver_evaluate',
            '__fxdriver_evaluate', '__driver_unwrapped', '__webdriver_unwrapped',
            '__selenium_unwrapped', '__fxdriver_unwrapped', '__webdriver_script_fn',
            '_Selenium_IDE_Recorder', '_selenium', 'calledSelenium',
            '$cdc_asdjflasutopfhvcZLmcfl_', '$chrome_asyncScriptInfo',
            '__$webdriverAsyncExecutor',
        ];
        for (const prop of windowProps) {
            try { if (prop in window) delete window[prop]; } catch (e) {}
        }
        for (const prop of documentProps) {
            try { if (prop in document) delete document[prop]; } catch (e) {}
        }

        // DevTools-protocol drivers recreate cdc_* globals after load; keep
        // sweeping them.
        const removeCdcArtifacts = () => {
            try {
                for (const prop in window) {
                    if (/cdc_[a-z0-9]/i.test(prop) || /^\$cdc_/.test(prop)) {
                        delete window[prop];
                    }
                }
            } catch (e) {}
        };
        removeCdcArtifacts();
        setInterval(removeCdcArtifacts, 50);

        // Headless builds lack the chrome.* surface real Chrome exposes.
        if (!window.chrome) window.chrome = {};
        if (!window.chrome.runtime) {
            window.chrome.runtime = {
                connect: () => {},
                sendMessage: () => {},
                onMessage: { addListener: () => {}, removeListener: () => {} },
                onConnect: { addListener: () => {}, removeListener: () => {} },
                id: undefined,
            };
        }
        if (!window.chrome.csi) {
            window.chrome.csi = () => ({
                startE: Date.now(),
                onloadT: Date.now(),
                pageT: Date.now() + seededNoise(1, 0) * 1000,
                tran: 15,
            });
        }
        if (!window.chrome.loadTimes) {
            const loadSeconds = Date.now() / 1000;
            window.chrome.loadTimes = () => ({
                commitLoadTime: loadSeconds,
                connectionInfo: 'h2',
                finishDocumentLoadTime: loadSeconds,
                finishLoadTime: loadSeconds,
                firstPaintAfterLoadTime: 0,
                firstPaintTime: loadSeconds,
                navigationType: 'Other',
                npnNegotiatedProtocol: 'h2',
                requestTime: loadSeconds,
                startLoadTime: loadSeconds,
                wasAlternateProtocolAvailable: false,
                wasFetchedViaSpdy: true,
                wasNpnNegotiated: true,
            });
        }

        // A denied notification permission on a fresh profile reads as
        // automation; report the prompt state instead.
        if (navigator.permissions && navigator.permissions.query) {
            const nativeQuery = navigator.permissions.query.bind(navigator.permissions);
            const spoofedQuery = (parameters) => {
                if (parameters && ['notifications', 'push', 'midi'].includes(parameters.name)) {
                    return nativeQuery(parameters).then((result) =>
                        result.state === 'denied' ? { state: 'prompt', onchange: null } : result
                    );
                }
                return nativeQuery(parameters);
            };
            spoofedFunctions.set(spoofedQuery, 'query');
            navigator.permissions.query = spoofedQuery;
        }
        if (typeof Notification !== 'undefined') {
            defineGetter(Notification, 'permission', 'default');
        }

        // Headless pages report themselves hidden.
        defineGetter(document, 'visibilityState', 'visible');
        defineGetter(document, 'hidden', false);
        window.addEventListener('visibilitychange', (e) => e.stopImmediatePropagation(), true);

        // Fixed device list; an empty one is a headless tell.
        if (navigator.mediaDevices && navigator.mediaDevices.enumerateDevices) {
            const spoofedEnumerateDevices = () => Promise.resolve([
                { deviceId: 'default', kind: 'audioinput', label: 'Default Audio Input', groupId: 'default' },
                { deviceId: 'default', kind: 'audiooutput', label: 'Default Audio Output', groupId: 'default' },
                { deviceId: 'default', kind: 'videoinput', label: 'Integrated Camera', groupId: 'default' },
            ]);
            spoofedFunctions.set(spoofedEnumerateDevices, 'enumerateDevices');
            navigator.mediaDevices.enumerateDevices = spoofedEnumerateDevices;
        }
    }
"#;
