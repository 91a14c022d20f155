use crate::AppState;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

pub async fn serve_dashboard(State(state): State<Arc<AppState>>) -> Response {
    let dashboard = &state.config.dashboard;
    // JSON string literals are valid JS string literals
    let placeholder = serde_json::to_string(&dashboard.placeholder_image_url)
        .unwrap_or_else(|_| "\"\"".to_string());
    let probe_timeout_ms = dashboard.probe_timeout_seconds * 1000;

    let html = DASHBOARD_PAGE
        .replace("__PLACEHOLDER_URL__", &placeholder)
        .replace("__PROBE_TIMEOUT_MS__", &probe_timeout_ms.to_string());

    Html(html).into_response()
}

const DASHBOARD_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>My Services Dashboard</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: #111827;
            color: #f3f4f6;
            min-height: 100vh;
            padding: 32px 16px;
        }

        .container {
            max-width: 1100px;
            margin: 0 auto;
        }

        header {
            text-align: center;
            margin-bottom: 40px;
        }

        h1 {
            font-size: 44px;
            font-weight: 800;
            margin-bottom: 12px;
        }

        .subtitle {
            color: #9ca3af;
            font-size: 18px;
        }

        form.add {
            background: #1f2937;
            padding: 16px;
            border-radius: 8px;
            margin-bottom: 32px;
        }

        label {
            display: block;
            color: #d1d5db;
            margin: 12px 0 6px;
            font-size: 14px;
        }

        input, textarea {
            width: 100%;
            padding: 8px;
            border: none;
            border-radius: 4px;
            background: #374151;
            color: #fff;
            font-size: 14px;
        }

        button {
            padding: 8px 16px;
            border: none;
            border-radius: 4px;
            background: #2563eb;
            color: #fff;
            cursor: pointer;
            margin-top: 16px;
        }

        button.secondary {
            background: #4b5563;
        }

        .empty {
            text-align: center;
            color: #9ca3af;
            font-size: 18px;
        }

        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(300px, 1fr));
            gap: 24px;
        }

        .card {
            position: relative;
            display: flex;
            align-items: center;
            gap: 24px;
            padding: 24px;
            background: #1f2937;
            border-radius: 16px;
            color: inherit;
            text-decoration: none;
            transition: transform 0.2s;
        }

        .card:hover {
            transform: scale(1.04);
        }

        .card img {
            width: 64px;
            height: 64px;
            border-radius: 50%;
            object-fit: cover;
            background: #374151;
            border: 2px solid #4b5563;
        }

        .card h2 {
            font-size: 22px;
            margin-bottom: 4px;
        }

        .card p {
            color: #9ca3af;
            font-size: 14px;
        }

        .status {
            position: absolute;
            top: 16px;
            right: 16px;
            width: 16px;
            height: 16px;
            border-radius: 50%;
            background: #9ca3af;
        }

        .status.online { background: #22c55e; }
        .status.offline { background: #ef4444; }

        .lock {
            position: absolute;
            top: 38px;
            right: 14px;
            font-size: 14px;
        }

        .modal {
            position: fixed;
            inset: 0;
            background: rgba(0, 0, 0, 0.5);
            display: none;
            align-items: center;
            justify-content: center;
            padding: 16px;
        }

        .modal.show {
            display: flex;
        }

        .modal form {
            background: #1f2937;
            border-radius: 8px;
            padding: 24px;
            width: 100%;
            max-width: 360px;
        }

        .modal .actions {
            display: flex;
            justify-content: flex-end;
            gap: 12px;
        }
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>My Services Dashboard</h1>
            <p class="subtitle">A simple, clean interface to access all your self-hosted applications and services.</p>
        </header>

        <form class="add" id="addForm">
            <h2>Add New Service</h2>
            <label for="name">Name</label>
            <input type="text" id="name" name="name" required>
            <label for="url">URL</label>
            <input type="url" id="url" name="url" required>
            <label for="description">Description</label>
            <textarea id="description" name="description"></textarea>
            <label for="imageUrl">Image URL</label>
            <input type="text" id="imageUrl" name="imageUrl">
            <label for="clickUrl">Click URL</label>
            <input type="url" id="clickUrl" name="clickUrl">
            <label for="password">Password</label>
            <input type="password" id="password" name="password" autocomplete="new-password">
            <button type="submit">Add Service</button>
        </form>

        <p class="empty" id="empty">Loading services...</p>
        <div class="grid" id="grid"></div>
    </div>

    <div class="modal" id="modal">
        <form id="passwordForm">
            <h3>Enter Password</h3>
            <label for="candidate">Password</label>
            <input type="password" id="candidate" name="candidate" placeholder="Enter password">
            <div class="actions">
                <button type="button" class="secondary" id="cancelBtn">Cancel</button>
                <button type="submit">Submit</button>
            </div>
        </form>
    </div>

    <script>
        const PLACEHOLDER_URL = __PLACEHOLDER_URL__;
        const PROBE_TIMEOUT_MS = __PROBE_TIMEOUT_MS__;
        const API = '/api/services';

        const statuses = {};
        const unlocked = {};
        let selected = null;
        // Bumped on every load; checks from older loads are ignored
        let loadGeneration = 0;

        const grid = document.getElementById('grid');
        const empty = document.getElementById('empty');
        const modal = document.getElementById('modal');
        const candidate = document.getElementById('candidate');

        const isProtected = (service) => Boolean(service.password);
        const OPTIONAL_FIELDS = ['description', 'imageUrl', 'clickUrl', 'password'];
        const isService = (record) =>
            record !== null && typeof record === 'object' &&
            typeof record.name === 'string' && typeof record.url === 'string' &&
            OPTIONAL_FIELDS.every((key) => record[key] == null || typeof record[key] === 'string');
        const targetOf = (service) => service.clickUrl || service.url;

        function setStatus(name, status) {
            statuses[name] = status;
            const badge = grid.querySelector(`[data-status="${CSS.escape(name)}"]`);
            if (badge) {
                badge.className = `status ${status}`;
                badge.title = `Status: ${status}`;
            }
        }

        async function probe(service, generation) {
            const controller = new AbortController();
            const timer = setTimeout(() => controller.abort(), PROBE_TIMEOUT_MS);
            let status = 'offline';
            try {
                await fetch(service.url, { mode: 'no-cors', signal: controller.signal });
                status = 'online';
            } catch (error) {
                status = 'offline';
            } finally {
                clearTimeout(timer);
            }
            if (generation === loadGeneration) {
                setStatus(service.name, status);
            }
        }

        function card(service) {
            const link = document.createElement('a');
            link.className = 'card';
            link.href = targetOf(service);
            link.target = '_blank';
            link.rel = 'noopener noreferrer';
            link.addEventListener('click', (e) => {
                if (isProtected(service) && !unlocked[service.name]) {
                    e.preventDefault();
                    selected = service;
                    candidate.value = '';
                    modal.classList.add('show');
                    candidate.focus();
                }
            });

            const badge = document.createElement('div');
            badge.className = 'status';
            badge.dataset.status = service.name;
            badge.title = 'Status: Checking...';
            link.appendChild(badge);

            if (isProtected(service)) {
                const lock = document.createElement('div');
                lock.className = 'lock';
                lock.textContent = '\u{1F512}';
                link.appendChild(lock);
            }

            const img = document.createElement('img');
            img.src = service.imageUrl || PLACEHOLDER_URL;
            img.alt = `${service.name} icon`;
            img.onerror = () => {
                img.onerror = null;
                img.src = PLACEHOLDER_URL;
            };
            link.appendChild(img);

            const text = document.createElement('div');
            const title = document.createElement('h2');
            title.textContent = service.name;
            const description = document.createElement('p');
            description.textContent = service.description || '';
            text.appendChild(title);
            text.appendChild(description);
            link.appendChild(text);

            return link;
        }

        async function fetchServices() {
            try {
                const response = await fetch(API);
                if (!response.ok) {
                    throw new Error('Failed to fetch services');
                }
                const records = await response.json();
                const services = records.filter(isService);
                if (services.length < records.length) {
                    console.warn(`Skipping ${records.length - services.length} malformed service records`);
                }
                // Array.prototype.sort is stable
                services.sort((a, b) => Number(isProtected(a)) - Number(isProtected(b)));

                const generation = ++loadGeneration;
                for (const name of Object.keys(statuses)) {
                    delete statuses[name];
                }
                grid.replaceChildren(...services.map(card));
                empty.textContent = 'No services found.';
                empty.style.display = services.length === 0 ? 'block' : 'none';

                services.forEach((service) => probe(service, generation));
            } catch (error) {
                console.error('Error fetching services:', error);
                alert(error.message);
            }
        }

        document.getElementById('passwordForm').addEventListener('submit', (e) => {
            e.preventDefault();
            if (selected && candidate.value === selected.password) {
                unlocked[selected.name] = candidate.value;
                modal.classList.remove('show');
                window.open(targetOf(selected), '_blank');
                selected = null;
            } else {
                alert('Incorrect password');
            }
        });

        document.getElementById('cancelBtn').addEventListener('click', () => {
            modal.classList.remove('show');
            selected = null;
        });

        document.getElementById('addForm').addEventListener('submit', async (e) => {
            e.preventDefault();
            const form = e.target;
            const body = {};
            for (const [key, value] of new FormData(form).entries()) {
                if (value !== '') {
                    body[key] = value;
                }
            }

            try {
                const response = await fetch(API, {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(body),
                });
                if (!response.ok) {
                    const data = await response.json().catch(() => ({}));
                    throw new Error(data.error || 'Failed to add service.');
                }
                alert('Service added successfully!');
                form.reset();
                fetchServices();
            } catch (error) {
                console.error('Error adding service:', error);
                alert(error.message);
            }
        });

        fetchServices();
    </script>
</body>
</html>"#;
