//! Page shells served behind the route guard.
//!
//! The dashboard itself (coin picker, price chart) is rendered client-side;
//! these handlers only provide the documents the guard protects.

use axum::response::{Html, Redirect};

use super::guard::DASHBOARD_PATH;

const SIGN_IN_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in · Crypto Tracker</title></head>
<body>
  <h1>Sign in</h1>
  <form id="sign-in">
    <input name="email" type="email" placeholder="Email" required>
    <input name="password" type="password" placeholder="Password" required>
    <button type="submit">Sign in</button>
  </form>
  <p id="error" role="alert"></p>
  <p><a href="/sign-up">Create an account</a></p>
  <script>
    document.getElementById("sign-in").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const res = await fetch("/api/auth/sign-in", {
        method: "POST",
        headers: { "content-type": "application/json" },
        body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
      });
      if (res.ok) { window.location.assign("/dashboard"); return; }
      const body = await res.json().catch(() => ({}));
      document.getElementById("error").textContent = body.error || "Something went wrong";
    });
  </script>
</body>
</html>
"#;

const SIGN_UP_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign up · Crypto Tracker</title></head>
<body>
  <h1>Create an account</h1>
  <form id="sign-up">
    <input name="name" placeholder="Name" required>
    <input name="email" type="email" placeholder="Email" required>
    <input name="password" type="password" placeholder="Password" minlength="8" required>
    <button type="submit">Sign up</button>
  </form>
  <p id="error" role="alert"></p>
  <p><a href="/sign-in">Already have an account?</a></p>
  <script>
    document.getElementById("sign-up").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const res = await fetch("/api/auth/sign-up", {
        method: "POST",
        headers: { "content-type": "application/json" },
        body: JSON.stringify(Object.fromEntries(form)),
      });
      if (res.ok) { window.location.assign("/sign-in"); return; }
      const body = await res.json().catch(() => ({}));
      document.getElementById("error").textContent = body.error || "Something went wrong";
    });
  </script>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Crypto Tracker</title></head>
<body>
  <header>
    <h1>Crypto Tracker</h1>
    <button id="sign-out">Sign out</button>
  </header>
  <main id="dashboard"></main>
  <script>
    document.getElementById("sign-out").addEventListener("click", async () => {
      await fetch("/api/auth/sign-out", { method: "POST" });
      window.location.assign("/sign-in");
    });
  </script>
</body>
</html>
"#;

pub async fn root() -> Redirect {
    Redirect::temporary(DASHBOARD_PATH)
}

pub async fn sign_in() -> Html<&'static str> {
    Html(SIGN_IN_HTML)
}

pub async fn sign_up() -> Html<&'static str> {
    Html(SIGN_UP_HTML)
}

pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
