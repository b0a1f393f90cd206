mod ode;
mod scheme;
