//! JavaScript evaluated inside the embedding page.
//!
//! Every snippet is a self-invoking expression so it can be passed to `Page::evaluate`
//! as is. String arguments are inlined as JSON literals.

use serde_json::json;

use super::surface::EmbedTarget;

pub const CONTAINER_ID: &str = "fabric-container";

pub fn load_sdk(sdk_url: &str) -> String {
    format!(
        r#"(async () => {{
    if (window['powerbi-client']) return true;
    await new Promise((resolve, reject) => {{
        const s = document.createElement('script');
        s.src = {url};
        s.onload = resolve;
        s.onerror = () => reject(new Error('Failed to load embedding SDK from ' + {url}));
        document.head.appendChild(s);
    }});
    return true;
}})()"#,
        url = json!(sdk_url)
    )
}

pub fn embed_report(target: &EmbedTarget, width: u32, height: u32) -> String {
    let config = json!({
        "reportId": target.report_id,
        "embedUrl": target.embed_url,
        "embedToken": target.embed_token,
    });
    format!(
        r#"(async () => {{
    const info = {config};
    const pbi = window['powerbi-client'];
    const models = pbi.models;
    const t0 = performance.now();

    let container = document.getElementById('{id}');
    if (!container) {{
        container = document.createElement('div');
        container.id = '{id}';
        document.body.appendChild(container);
    }}
    container.style.width = '{width}px';
    container.style.height = '{height}px';

    const service = new pbi.service.Service(
        pbi.factories.hpmFactory,
        pbi.factories.wpmpFactory,
        pbi.factories.routerFactory
    );
    const report = service.embed(container, {{
        type: 'report',
        id: info.reportId,
        embedUrl: info.embedUrl,
        accessToken: info.embedToken,
        tokenType: models.TokenType.Embed,
        permissions: models.Permissions.Read,
        viewMode: models.ViewMode.View,
        settings: {{ visualRenderedEvents: true }}
    }});
    window.__fabricReport = report;

    await new Promise((resolve, reject) => {{
        report.on('loaded', () => resolve());
        report.on('error', (e) => reject(new Error(e?.detail?.message || 'Report failed to load')));
    }});
    report.off('loaded');
    report.off('error');
    return performance.now() - t0;
}})()"#,
        config = config,
        id = CONTAINER_ID,
        width = width,
        height = height,
    )
}

pub const LIST_PAGES: &str = r#"(async () => {
    const pages = await window.__fabricReport.getPages();
    return pages.map(p => p.name);
})()"#;

pub fn list_visuals(page: &str) -> String {
    format!(
        r#"(async () => {{
    const pages = await window.__fabricReport.getPages();
    const target = pages.find(p => p.name === {page});
    if (!target) return [];
    const visuals = await target.getVisuals();
    return visuals.map(v => ({{ id: v.name, title: v.title || null, kind: v.type || '' }}));
}})()"#,
        page = json!(page)
    )
}

pub fn activate_page(page: &str) -> String {
    format!(
        r#"(async () => {{
    const pages = await window.__fabricReport.getPages();
    const target = pages.find(p => p.name === {page});
    if (!target) return false;
    await target.setActive();
    return true;
}})()"#,
        page = json!(page)
    )
}

pub const LISTEN: &str = r#"(() => {
    const report = window.__fabricReport;
    const probe = { rendered: [], errors: [] };
    probe.onRendered = (e) => { const n = e?.detail?.name; if (n) probe.rendered.push(n); };
    probe.onError = (e) => { probe.errors.push(e?.detail?.message || 'Unknown Power BI error'); };
    report.on('visualRendered', probe.onRendered);
    report.on('error', probe.onError);
    window.__fabricProbe = probe;
    return true;
})()"#;

/// Hands over and clears whatever events arrived since the previous drain.
pub const DRAIN: &str = r#"(() => {
    const probe = window.__fabricProbe;
    if (!probe) return { rendered: [], errors: [] };
    return { rendered: probe.rendered.splice(0), errors: probe.errors.splice(0) };
})()"#;

pub const UNLISTEN: &str = r#"(() => {
    const probe = window.__fabricProbe;
    if (!probe) return true;
    window.__fabricReport.off('visualRendered', probe.onRendered);
    window.__fabricReport.off('error', probe.onError);
    delete window.__fabricProbe;
    return true;
})()"#;
